// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Email/password verification against the identity store.
//!
//! Hashing and the actual password check live upstream; this layer only
//! validates input, calls the store, and collapses every failure into a
//! generic `InvalidCredentials` so responses never reveal which field was
//! wrong.
//!
//! A verified email is then resolved to its identity in the users table,
//! the same way OAuth sign-ins are, so one email maps to one user id
//! whichever way the user signs in.

use super::{normalize_email, AccountLinker, AuthError, Identity, NewIdentity, Provider};
use crate::storage::{IdentityStore, UserStore};

/// Identity plus the upstream access token returned by a password sign-in.
#[derive(Debug, Clone)]
pub struct VerifiedCredentials {
    pub identity: Identity,
    pub access_token: Option<String>,
}

/// Validate raw sign-in input.
///
/// Returns the normalized email and the password untouched.
pub fn require_credentials<'a>(
    email: Option<&str>,
    password: Option<&'a str>,
) -> Result<(String, &'a str), AuthError> {
    let email = email.map(str::trim).filter(|e| !e.is_empty());
    let password = password.filter(|p| !p.trim().is_empty());
    let (Some(email), Some(password)) = (email, password) else {
        return Err(AuthError::MissingInput);
    };
    let email = normalize_email(email).ok_or(AuthError::MissingInput)?;
    Ok((email, password))
}

/// Verifier for email/password sign-in.
pub struct CredentialVerifier<'a> {
    store: &'a dyn IdentityStore,
    users: &'a dyn UserStore,
}

impl<'a> CredentialVerifier<'a> {
    pub fn new(store: &'a dyn IdentityStore, users: &'a dyn UserStore) -> Self {
        Self { store, users }
    }

    /// Verify an email/password pair.
    ///
    /// # Errors
    /// - `MissingInput` if either field is absent, blank, or the email is
    ///   malformed. No upstream call is made.
    /// - `InvalidCredentials` for any upstream failure.
    /// - `LinkFailure` when the users table lookup or insert fails.
    pub async fn verify(
        &self,
        email: Option<&str>,
        password: Option<&str>,
    ) -> Result<VerifiedCredentials, AuthError> {
        let (email, password) = require_credentials(email, password)?;

        let user = self
            .store
            .sign_in_with_password(&email, password)
            .await
            .map_err(|e| {
                tracing::info!(error = %e, "Password sign-in rejected");
                AuthError::InvalidCredentials
            })?;

        let Some(upstream_email) = user.email.as_deref().and_then(normalize_email) else {
            tracing::warn!(user_id = %user.id, "Identity store returned a user without an email");
            return Err(AuthError::InvalidCredentials);
        };
        if upstream_email != email {
            tracing::warn!(user_id = %user.id, "Identity store returned a different email");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = AccountLinker::new(self.users)
            .find_or_create(NewIdentity {
                email,
                name: user.name,
                avatar_url: user.avatar_url,
                provider: Provider::Credentials,
            })
            .await
            .map_err(|e| {
                let err = AuthError::link_failure(Provider::Credentials, &e);
                tracing::error!(
                    account_id = %user.id,
                    error = %err,
                    "Could not resolve identity for password sign-in"
                );
                err
            })?;

        Ok(VerifiedCredentials {
            identity,
            access_token: user.access_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryBackend, StorageError, StorageResult, VerifiedUser};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that counts calls and returns a canned result.
    struct CountingStore {
        calls: AtomicUsize,
        email: Option<String>,
    }

    #[async_trait]
    impl IdentityStore for CountingStore {
        async fn sign_in_with_password(&self, _: &str, _: &str) -> StorageResult<VerifiedUser> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(VerifiedUser {
                id: "upstream-1".into(),
                email: self.email.clone(),
                name: None,
                avatar_url: None,
                access_token: None,
            })
        }

        async fn sign_up(&self, _: &str, _: &str) -> StorageResult<VerifiedUser> {
            Err(StorageError::Rejected("unused".into()))
        }
    }

    fn counting(email: Option<&str>) -> CountingStore {
        CountingStore {
            calls: AtomicUsize::new(0),
            email: email.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn accepted_credentials_return_matching_identity() {
        let backend = MemoryBackend::new();
        backend.sign_up("lifter@example.com", "hunter22").await.unwrap();

        let verified = CredentialVerifier::new(&backend, &backend)
            .verify(Some("Lifter@Example.com"), Some("hunter22"))
            .await
            .unwrap();

        assert_eq!(verified.identity.email, "lifter@example.com");
        assert_eq!(verified.identity.provider, Provider::Credentials);
        assert!(verified.access_token.is_some());
        assert_eq!(backend.user_count().await, 1);
    }

    #[tokio::test]
    async fn repeated_sign_ins_keep_one_user_id() {
        let backend = MemoryBackend::new();
        backend.sign_up("lifter@example.com", "hunter22").await.unwrap();
        let verifier = CredentialVerifier::new(&backend, &backend);

        let first = verifier
            .verify(Some("lifter@example.com"), Some("hunter22"))
            .await
            .unwrap();
        let second = verifier
            .verify(Some("LIFTER@example.com"), Some("hunter22"))
            .await
            .unwrap();

        assert_eq!(first.identity.id, second.identity.id);
        assert_eq!(backend.user_count().await, 1);
    }

    #[tokio::test]
    async fn password_sign_in_reuses_identity_created_by_oauth() {
        let backend = MemoryBackend::new();
        let existing = backend
            .insert_user(NewIdentity {
                email: "lifter@example.com".into(),
                name: Some("Lifter".into()),
                avatar_url: None,
                provider: Provider::Google,
            })
            .await
            .unwrap();
        backend.sign_up("lifter@example.com", "hunter22").await.unwrap();

        let verified = CredentialVerifier::new(&backend, &backend)
            .verify(Some("lifter@example.com"), Some("hunter22"))
            .await
            .unwrap();

        assert_eq!(verified.identity, existing);
    }

    #[tokio::test]
    async fn users_table_failure_is_link_failure() {
        struct Unreachable;

        #[async_trait]
        impl UserStore for Unreachable {
            async fn find_user_by_email(&self, _: &str) -> StorageResult<Identity> {
                Err(StorageError::Upstream("connection reset".into()))
            }
            async fn insert_user(&self, _: NewIdentity) -> StorageResult<Identity> {
                panic!("insert must not follow a failed lookup");
            }
            async fn ping(&self) -> StorageResult<()> {
                Err(StorageError::Upstream("connection reset".into()))
            }
        }

        let store = counting(Some("a@example.com"));
        let result = CredentialVerifier::new(&store, &Unreachable)
            .verify(Some("a@example.com"), Some("pw"))
            .await;
        assert!(matches!(result, Err(AuthError::LinkFailure { .. })));
    }

    #[tokio::test]
    async fn missing_input_fails_before_upstream_call() {
        let store = counting(Some("a@example.com"));
        let users = MemoryBackend::new();
        let verifier = CredentialVerifier::new(&store, &users);

        for (email, password) in [
            (None, Some("pw")),
            (Some("a@example.com"), None),
            (Some("   "), Some("pw")),
            (Some("a@example.com"), Some("  ")),
            (Some("not-an-email"), Some("pw")),
            (None, None),
        ] {
            let result = verifier.verify(email, password).await;
            assert!(matches!(result, Err(AuthError::MissingInput)));
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let backend = MemoryBackend::new();
        backend.sign_up("lifter@example.com", "hunter22").await.unwrap();

        let result = CredentialVerifier::new(&backend, &backend)
            .verify(Some("lifter@example.com"), Some("wrong-password"))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        let unknown = CredentialVerifier::new(&backend, &backend)
            .verify(Some("nobody@example.com"), Some("hunter22"))
            .await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn upstream_user_without_email_is_rejected() {
        let store = counting(None);
        let users = MemoryBackend::new();
        let result = CredentialVerifier::new(&store, &users)
            .verify(Some("a@example.com"), Some("pw"))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn upstream_email_mismatch_is_rejected() {
        let store = counting(Some("someone-else@example.com"));
        let users = MemoryBackend::new();
        let result = CredentialVerifier::new(&store, &users)
            .verify(Some("a@example.com"), Some("pw"))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }
}
