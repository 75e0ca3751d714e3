// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Sign-in, sign-up, and session endpoints.
//!
//! Every successful sign-in, regardless of provider, returns the same
//! [`SignInResponse`] and sets the session cookie.

use axum::{
    extract::{Path, Query, State},
    http::{header::SET_COOKIE, HeaderName, HeaderValue, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::{
        credentials::require_credentials,
        extractor::{cleared_session_cookie, session_cookie},
        AccountLinker, Auth, AuthError, ClientSessionView, CredentialVerifier, Identity,
        OAuthGrant, OptionalAuth, Provider, ProviderInfo,
    },
    state::AppState,
    storage::StorageError,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Where to send the user afterwards; off-origin targets are ignored.
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// Authorization code the provider returned to the browser.
///
/// The profile is read from the provider after redeeming the code; no
/// identity fields are accepted from the client.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OAuthCallbackRequest {
    pub code: String,
    /// PKCE verifier matching the challenge sent with the authorization request.
    #[serde(default)]
    pub code_verifier: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignUpRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignInResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub session: ClientSessionView,
    pub redirect_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignUpResponse {
    pub message: String,
    pub user: RegisteredUser,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignOutResponse {
    pub redirect_url: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SignOutQuery {
    pub callback_url: Option<String>,
}

type WithCookie<T> = ([(HeaderName, HeaderValue); 1], Json<T>);

/// Sign a session for `identity` and build the response.
fn establish_session(
    state: &AppState,
    identity: &Identity,
    provider: Provider,
    access_token: Option<String>,
    callback_url: Option<&str>,
) -> Result<WithCookie<SignInResponse>, AuthError> {
    let issued = state
        .sessions
        .issue(identity, provider, access_token, Utc::now())?;
    let cookie = session_cookie(&issued.token, state.redirects.is_https())?;

    tracing::info!(
        provider = %provider,
        user_id = %identity.id,
        "Session issued"
    );

    Ok((
        [(SET_COOKIE, cookie)],
        Json(SignInResponse {
            expires_at: issued.claims.expires_at(),
            session: ClientSessionView::project(&issued.claims, Some(identity)),
            token: issued.token,
            redirect_url: state.redirects.resolve_opt(callback_url),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/auth/providers",
    tag = "Auth",
    responses((status = 200, body = [ProviderInfo]))
)]
pub async fn list_providers(State(state): State<AppState>) -> Json<Vec<ProviderInfo>> {
    Json(state.providers.list())
}

#[utoipa::path(
    post,
    path = "/v1/auth/signin",
    request_body = SignInRequest,
    tag = "Auth",
    responses(
        (status = 200, body = SignInResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid email or password")
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<WithCookie<SignInResponse>, AuthError> {
    let verified = CredentialVerifier::new(state.identities.as_ref(), state.users.as_ref())
        .verify(request.email.as_deref(), request.password.as_deref())
        .await?;

    establish_session(
        &state,
        &verified.identity,
        Provider::Credentials,
        verified.access_token,
        request.callback_url.as_deref(),
    )
}

#[utoipa::path(
    post,
    path = "/v1/auth/callback/{provider}",
    params(("provider" = String, Path, description = "google, github, or azure-ad")),
    request_body = OAuthCallbackRequest,
    tag = "Auth",
    responses(
        (status = 200, body = SignInResponse),
        (status = 400, description = "Provider unknown or not enabled"),
        (status = 401, description = "Code rejected by the provider or account could not be linked")
    )
)]
pub async fn oauth_callback(
    Path(provider): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<OAuthCallbackRequest>,
) -> Result<WithCookie<SignInResponse>, AuthError> {
    let provider = provider
        .parse::<Provider>()
        .ok()
        .filter(|p| p.is_oauth() && state.providers.is_enabled(*p))
        .ok_or(AuthError::UnknownProvider(provider))?;
    let verifier = state
        .oauth
        .as_ref()
        .ok_or_else(|| AuthError::UnknownProvider(provider.as_str().to_string()))?;

    let grant = OAuthGrant {
        code: request.code,
        code_verifier: request.code_verifier,
    };
    let verified = verifier
        .verify(provider, &grant)
        .await
        .inspect_err(|e| tracing::warn!(provider = %provider, error = %e, "OAuth sign-in rejected"))?;
    let identity = AccountLinker::new(state.users.as_ref())
        .link(&verified.profile)
        .await?;

    establish_session(
        &state,
        &identity,
        provider,
        Some(verified.access_token),
        request.callback_url.as_deref(),
    )
}

#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignUpRequest,
    tag = "Auth",
    responses(
        (status = 201, body = SignUpResponse),
        (status = 400, description = "Missing input or rejected by the identity store"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpResponse>), AuthError> {
    let (email, password) =
        require_credentials(request.email.as_deref(), request.password.as_deref())?;

    let user = state
        .identities
        .sign_up(&email, password)
        .await
        .map_err(|e| match e {
            StorageError::AlreadyExists(_) => AuthError::AccountExists,
            StorageError::Rejected(msg) => {
                tracing::info!(error = %msg, "Sign-up rejected");
                AuthError::RegistrationFailed(msg)
            }
            other => AuthError::Internal(other.to_string()),
        })?;

    tracing::info!(user_id = %user.id, "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            message: "User created successfully".to_string(),
            user: RegisteredUser {
                id: user.id,
                email: user.email,
            },
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/auth/signout",
    params(SignOutQuery),
    tag = "Auth",
    responses((status = 200, body = SignOutResponse))
)]
pub async fn sign_out(
    OptionalAuth(session): OptionalAuth,
    State(state): State<AppState>,
    Query(query): Query<SignOutQuery>,
) -> WithCookie<SignOutResponse> {
    if let Some(session) = session {
        tracing::info!(user_id = %session.user_id(), "Signed out");
    }

    (
        [(SET_COOKIE, cleared_session_cookie(state.redirects.is_https()))],
        Json(SignOutResponse {
            redirect_url: state.redirects.resolve_opt(query.callback_url.as_deref()),
        }),
    )
}

/// Current session as the client sees it.
///
/// Profile fields come from the stored identity when one exists, so a
/// renamed user sees the new name without signing in again.
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    tag = "Auth",
    responses(
        (status = 200, body = ClientSessionView),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_session(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Json<ClientSessionView> {
    let identity = match state.users.find_user_by_email(&session.email).await {
        Ok(identity) if identity.id == session.user_id() => Some(identity),
        Ok(_) | Err(StorageError::NotFound(_)) => None,
        Err(e) => {
            tracing::warn!(error = %e, user_id = %session.user_id(), "Profile lookup failed");
            None
        }
    };
    Json(ClientSessionView::project(&session, identity.as_ref()))
}
