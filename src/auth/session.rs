// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Session token issuance and projection.
//!
//! ## Token Shape
//!
//! Sessions are HS256 JWTs held by the client:
//!
//! | Claim | Meaning |
//! |-------|---------|
//! | `sub` | identity id |
//! | `userId` | identity id (canonical; `sub` is the fallback) |
//! | `email`, `name`, `image` | profile snapshot at sign-in |
//! | `provider` | sign-in method |
//! | `accessToken` | opaque upstream token, if any |
//! | `iss`, `iat`, `exp` | issuer and lifetime |
//!
//! Tokens live for [`SESSION_MAX_AGE`] from issuance. There is no sliding
//! renewal; a session past `exp` (plus clock skew) must sign in again.
//!
//! The client-visible [`ClientSessionView`] is recomputed from the token on
//! every request and never stored.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{AuthError, Identity, Provider};

/// Maximum session lifetime.
pub const SESSION_MAX_AGE: Duration = Duration::days(30);

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: i64 = 60;

/// Decoded session token claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionToken {
    pub sub: String,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub provider: Provider,
    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionToken {
    /// Identity id: the `userId` claim, or `sub` when it is absent or blank.
    pub fn user_id(&self) -> &str {
        self.user_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(&self.sub)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly signed session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionToken,
}

/// Client-visible session, derived per request.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct ClientSessionView {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl ClientSessionView {
    /// Project a token, preferring current profile fields from `identity`.
    pub fn project(token: &SessionToken, identity: Option<&Identity>) -> Self {
        let name = identity
            .and_then(|i| i.name.clone())
            .or_else(|| token.name.clone());
        let image = identity
            .and_then(|i| i.avatar_url.clone())
            .or_else(|| token.image.clone());

        Self {
            user_id: token.user_id().to_string(),
            email: token.email.clone(),
            name,
            image,
            provider: token.provider,
            access_token: token.access_token.clone(),
            expires_at: token.expires_at(),
        }
    }
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct SessionComposer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
}

impl SessionComposer {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Issue a session for an authenticated identity.
    pub fn issue(
        &self,
        identity: &Identity,
        provider: Provider,
        access_token: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, AuthError> {
        let claims = SessionToken {
            sub: identity.id.clone(),
            user_id: Some(identity.id.clone()),
            email: identity.email.clone(),
            name: identity.name.clone(),
            image: identity.avatar_url.clone(),
            provider,
            access_token,
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: (now + SESSION_MAX_AGE).timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok(IssuedSession { token, claims })
    }

    pub(crate) fn sign(&self, claims: &SessionToken) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("failed to sign session token: {e}")))
    }

    /// Verify a token's signature and issuer, then its age against `now`.
    pub fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<SessionToken, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<SessionToken>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidIssuer
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            }
        })?;

        let claims = data.claims;
        if now.timestamp() > claims.exp + CLOCK_SKEW_LEEWAY {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }
}
