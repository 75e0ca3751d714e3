// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! # Authentication Module
//!
//! Identity resolution and session shaping for every sign-in, regardless of
//! method.
//!
//! ## Auth Flow
//!
//! 1. Email/password: [`CredentialVerifier`] validates input, asks the
//!    hosted identity store to check the password, and resolves the local
//!    identity for the email.
//! 2. OAuth: [`OAuthClient`] redeems the authorization code with the
//!    provider and reads back its profile; [`AccountLinker`] finds or
//!    creates the local identity for the profile's email.
//! 3. [`SessionComposer`] signs a session token (30-day max age) carrying
//!    the identity id, provider, and upstream access token.
//! 4. On every request the `Auth` extractor verifies the token and
//!    [`ClientSessionView::project`] derives the client view.
//! 5. [`RedirectPolicy`] restricts post-auth navigation to our origin.
//!
//! ## Security
//!
//! - User-facing errors are generic; upstream detail is only logged
//! - Password hashing stays with the hosted identity store
//! - OAuth profiles come from the provider's userinfo reply, never the client
//! - Clock skew tolerance is 60 seconds

pub mod credentials;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod linker;
pub mod oauth;
pub mod providers;
pub mod redirect;
pub mod session;

pub use credentials::{CredentialVerifier, VerifiedCredentials};
pub use error::AuthError;
pub use extractor::{Auth, OptionalAuth};
pub use identity::{normalize_email, Identity, NewIdentity, Provider};
pub use linker::{AccountLinker, OAuthProfile};
pub use oauth::{OAuthClient, OAuthGrant, ProfileVerifier, VerifiedProfile};
pub use providers::{ProviderInfo, ProviderRegistry};
pub use redirect::RedirectPolicy;
pub use session::{ClientSessionView, IssuedSession, SessionComposer, SessionToken, SESSION_MAX_AGE};
