// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::Provider;

/// Authentication error type.
///
/// `Display` carries operator detail and is meant for logs. Responses only
/// ever contain [`AuthError::public_message`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Email or password absent or blank
    #[error("missing sign-in input")]
    MissingInput,
    /// Identity store refused the email/password pair
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Account lookup or creation failed during OAuth sign-in
    #[error("account linking failed for {provider}: {cause}")]
    LinkFailure { provider: String, cause: String },
    /// The provider refused the authorization code or returned an unusable profile
    #[error("{provider} did not verify the sign-in: {cause}")]
    OAuthRejected { provider: String, cause: String },
    /// Redirect target could not be parsed; never surfaced to users
    #[error("malformed redirect target: {0}")]
    MalformedRedirect(String),
    /// Provider is unknown or not enabled
    #[error("unsupported provider: {0}")]
    UnknownProvider(String),
    /// Sign-up for an email that already has an account
    #[error("account already exists")]
    AccountExists,
    /// Identity store refused the registration
    #[error("registration rejected: {0}")]
    RegistrationFailed(String),
    /// No session token on the request
    #[error("missing session token")]
    MissingAuthHeader,
    /// Authorization header is not `Bearer <token>`
    #[error("invalid authorization header")]
    InvalidAuthHeader,
    /// Token could not be decoded
    #[error("malformed token")]
    MalformedToken,
    /// Token signature or issuer does not match
    #[error("invalid token signature")]
    InvalidSignature,
    /// Token is past its maximum age
    #[error("token expired")]
    TokenExpired,
    /// Internal error
    #[error("internal authentication error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: &'static str,
    error_code: &'static str,
}

impl AuthError {
    /// Build a link failure from a provider and any displayable cause.
    pub fn link_failure(provider: Provider, cause: impl std::fmt::Display) -> Self {
        AuthError::LinkFailure {
            provider: provider.as_str().to_string(),
            cause: cause.to_string(),
        }
    }

    /// Build a provider rejection from a provider and any displayable cause.
    pub fn oauth_rejected(provider: Provider, cause: impl std::fmt::Display) -> Self {
        AuthError::OAuthRejected {
            provider: provider.as_str().to_string(),
            cause: cause.to_string(),
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingInput => "missing_input",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::LinkFailure { .. } => "authentication_failed",
            AuthError::OAuthRejected { .. } => "oauth_rejected",
            AuthError::MalformedRedirect(_) => "malformed_redirect",
            AuthError::UnknownProvider(_) => "unknown_provider",
            AuthError::AccountExists => "account_exists",
            AuthError::RegistrationFailed(_) => "registration_failed",
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingInput
            | AuthError::MalformedRedirect(_)
            | AuthError::UnknownProvider(_)
            | AuthError::RegistrationFailed(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::LinkFailure { .. }
            | AuthError::OAuthRejected { .. }
            | AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::InvalidSignature
            | AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::AccountExists => StatusCode::CONFLICT,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message; never includes upstream detail.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingInput => "Please enter an email and password",
            AuthError::InvalidCredentials => "Invalid email or password",
            AuthError::LinkFailure { .. } | AuthError::OAuthRejected { .. } => {
                "Unable to sign in. Please try again."
            }
            AuthError::MalformedRedirect(_) => "Invalid redirect target",
            AuthError::UnknownProvider(_) => "Unsupported sign-in provider",
            AuthError::AccountExists => "An account with this email already exists",
            AuthError::RegistrationFailed(_) => "Unable to create account",
            AuthError::MissingAuthHeader => "Authentication is required",
            AuthError::InvalidAuthHeader => {
                "Invalid authorization header format (expected 'Bearer <token>')"
            }
            AuthError::MalformedToken => "Session token is malformed",
            AuthError::InvalidSignature => "Session token is invalid",
            AuthError::TokenExpired => "Session has expired. Please sign in again.",
            AuthError::Internal(_) => "Internal authentication error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Authentication failed");
        }
        let body = Json(AuthErrorBody {
            error: self.public_message(),
            error_code: self.error_code(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_auth_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_auth_header");
    }

    #[tokio::test]
    async fn link_failure_hides_cause() {
        let err = AuthError::link_failure(
            Provider::Github,
            "duplicate key value violates unique constraint \"users_email_key\"",
        );
        assert!(err.to_string().contains("users_email_key"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert!(!body.contains("users_email_key"));
        assert!(body.contains("authentication_failed"));
    }

    #[test]
    fn input_errors_are_client_errors() {
        assert_eq!(AuthError::MissingInput.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::AccountExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
