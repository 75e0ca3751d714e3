// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Axum extractors for authenticated sessions.
//!
//! Use the `Auth` extractor in handlers to require a session:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(session): Auth) -> impl IntoResponse {
//!     // session is a verified SessionToken
//! }
//! ```
//!
//! The token is read from `Authorization: Bearer <token>` first, then from
//! the session cookie set at sign-in.

use axum::{
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderValue,
    },
};
use chrono::Utc;

use super::{AuthError, SessionToken, SESSION_MAX_AGE};
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "fittrack.session-token";

/// Extractor for a verified session.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_workouts(
///     Auth(session): Auth,
///     State(state): State<AppState>,
/// ) -> Result<Json<Vec<Workout>>, ApiError> {
///     // session.user_id() is the authenticated identity
/// }
/// ```
pub struct Auth(pub SessionToken);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // First check if an earlier layer already verified the session
        if let Some(session) = parts.extensions.get::<SessionToken>().cloned() {
            return Ok(Auth(session));
        }

        let token = token_from_parts(parts)?;
        let session = state.sessions.decode(&token, Utc::now())?;
        parts.extensions.insert(session.clone());
        Ok(Auth(session))
    }
}

/// Optional authentication extractor.
///
/// Returns `None` if no valid session is present, instead of rejecting.
pub struct OptionalAuth(pub Option<SessionToken>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match Auth::from_request_parts(parts, state).await {
            Ok(Auth(session)) => Ok(OptionalAuth(Some(session))),
            Err(_) => Ok(OptionalAuth(None)),
        }
    }
}

/// Pull the raw token from the Authorization header or session cookie.
fn token_from_parts(parts: &Parts) -> Result<String, AuthError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidAuthHeader)?;
        return Ok(token.to_string());
    }

    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
        .ok_or(AuthError::MissingAuthHeader)
}

/// `Set-Cookie` value carrying a freshly issued token.
pub fn session_cookie(token: &str, secure: bool) -> Result<HeaderValue, AuthError> {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_MAX_AGE.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| AuthError::Internal(e.to_string()))
}

/// `Set-Cookie` value that removes the session cookie.
pub fn cleared_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static(
            "fittrack.session-token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure",
        )
    } else {
        HeaderValue::from_static("fittrack.session-token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Identity, Provider};
    use crate::state::AppState;
    use axum::http::Request;

    fn issue(state: &AppState) -> String {
        let identity = Identity {
            id: "user_123".into(),
            email: "pat@example.com".into(),
            name: None,
            avatar_url: None,
            provider: Provider::Credentials,
            created_at: Utc::now(),
        };
        state
            .sessions
            .issue(&identity, Provider::Credentials, None, Utc::now())
            .unwrap()
            .token
    }

    fn parts_with(header: Option<(&str, String)>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_token() {
        let state = AppState::default();
        let mut parts = parts_with(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_accepts_bearer_token() {
        let state = AppState::default();
        let token = issue(&state);
        let mut parts = parts_with(Some(("Authorization", format!("Bearer {token}"))));

        let Auth(session) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(session.user_id(), "user_123");
    }

    #[tokio::test]
    async fn auth_extractor_accepts_session_cookie() {
        let state = AppState::default();
        let token = issue(&state);
        let mut parts = parts_with(Some((
            "Cookie",
            format!("theme=dark; {SESSION_COOKIE}={token}; other=1"),
        )));

        let Auth(session) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(session.email, "pat@example.com");
    }

    #[tokio::test]
    async fn auth_extractor_rejects_non_bearer_scheme() {
        let state = AppState::default();
        let mut parts = parts_with(Some(("Authorization", "Basic dXNlcjpwYXNz".to_string())));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_rejects_foreign_token() {
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

        let state = AppState::default();
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(
            r#"{"sub":"intruder","email":"x@example.com","provider":"google","iss":"http://localhost:3000","iat":1,"exp":9999999999}"#,
        );
        let forged = format!("{header}.{claims}.c2lnbmF0dXJl");
        let mut parts = parts_with(Some(("Authorization", format!("Bearer {forged}"))));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::InvalidSignature)));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let state = AppState::default();
        let mut parts = parts_with(None);
        let token = issue(&state);
        let session = state.sessions.decode(&token, Utc::now()).unwrap();
        parts.extensions.insert(session.clone());

        let Auth(found) = Auth::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(found, session);
    }

    #[tokio::test]
    async fn optional_auth_never_rejects() {
        let state = AppState::default();
        let mut parts = parts_with(Some(("Authorization", "Bearer garbage".to_string())));

        let OptionalAuth(session) = OptionalAuth::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(session.is_none());
    }

    #[test]
    fn cookies_carry_expected_attributes() {
        let set = session_cookie("abc", true).unwrap();
        let set = set.to_str().unwrap();
        assert!(set.starts_with("fittrack.session-token=abc;"));
        assert!(set.contains("HttpOnly"));
        assert!(set.contains("Max-Age=2592000"));
        assert!(set.ends_with("; Secure"));

        for secure in [true, false] {
            let cleared = cleared_session_cookie(secure);
            let cleared = cleared.to_str().unwrap();
            assert!(cleared.starts_with(&format!("{SESSION_COOKIE}=;")));
            assert!(cleared.contains("Max-Age=0"));
        }
    }
}
