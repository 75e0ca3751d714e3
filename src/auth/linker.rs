// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Account linking.
//!
//! Runs after the upstream provider (or the identity store, for password
//! sign-in) has verified the user. Ensures exactly one [`Identity`] exists
//! for the email:
//!
//! 1. Look up by email.
//! 2. "No rows" is the expected first-sign-in branch: insert a new identity
//!    stamped with the originating provider.
//! 3. An existing identity is returned unchanged, even when it was created
//!    by a different provider.
//!
//! There is no in-process lock. Two concurrent first-time sign-ins for one
//! email both reach the insert; the store's uniqueness constraint rejects
//! the second, which surfaces as `LinkFailure`.

use super::{normalize_email, AuthError, Identity, NewIdentity, Provider};
use crate::storage::{StorageError, StorageResult, UserStore};

/// Verified profile handed over by the upstream OAuth provider.
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub provider: Provider,
    /// Account id at the provider (the OAuth `sub`).
    pub provider_account_id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

pub struct AccountLinker<'a> {
    users: &'a dyn UserStore,
}

impl<'a> AccountLinker<'a> {
    pub fn new(users: &'a dyn UserStore) -> Self {
        Self { users }
    }

    /// Find or create the identity for an OAuth profile.
    ///
    /// # Errors
    /// `LinkFailure` for a non-OAuth provider, a blank/malformed email, or
    /// any store error other than "not found" (including a uniqueness
    /// conflict from a concurrent insert).
    pub async fn link(&self, profile: &OAuthProfile) -> Result<Identity, AuthError> {
        let provider = profile.provider;
        let failure = |cause: &dyn std::fmt::Display| {
            let err = AuthError::link_failure(provider, cause);
            tracing::error!(
                provider = %provider,
                provider_account_id = %profile.provider_account_id,
                error = %err,
                "OAuth account linking failed"
            );
            err
        };

        if !provider.is_oauth() {
            return Err(failure(&"provider is not an OAuth provider"));
        }
        let Some(email) = normalize_email(&profile.email) else {
            return Err(failure(&"profile has no usable email"));
        };

        self.find_or_create(NewIdentity {
            email,
            name: profile.name.clone(),
            avatar_url: profile.image.clone(),
            provider,
        })
        .await
        .map_err(|e| failure(&e))
    }

    /// Return the identity for `user.email`, inserting `user` when none exists.
    ///
    /// The email must already be normalized. An existing identity is returned
    /// unchanged. Insert conflicts are not retried.
    pub async fn find_or_create(&self, user: NewIdentity) -> StorageResult<Identity> {
        let provider = user.provider;
        match self.users.find_user_by_email(&user.email).await {
            Ok(existing) => {
                tracing::debug!(
                    provider = %provider,
                    user_id = %existing.id,
                    "Sign-in matched existing identity"
                );
                Ok(existing)
            }
            Err(StorageError::NotFound(_)) => {
                let created = self.users.insert_user(user).await?;
                tracing::info!(
                    provider = %provider,
                    user_id = %created.id,
                    "Created identity on first sign-in"
                );
                Ok(created)
            }
            Err(e) => Err(e),
        }
    }
}
