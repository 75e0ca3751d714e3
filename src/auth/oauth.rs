// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! OAuth code redemption and profile verification.
//!
//! The browser completes the provider's consent screen and hands the
//! authorization code to the callback endpoint. The code is redeemed here
//! with the registered client secret, and the profile is read back from the
//! provider with the resulting access token. Only that response is handed
//! to the [`AccountLinker`](super::AccountLinker).
//!
//! | Provider | Token endpoint | Profile |
//! |----------|----------------|---------|
//! | Google | `oauth2.googleapis.com/token` | OIDC userinfo, `email_verified` required |
//! | GitHub | `github.com/login/oauth/access_token` | `/user`, then `/user/emails` when the public email is hidden |
//! | Microsoft | `login.microsoftonline.com/{tenant}/oauth2/v2.0/token` | Graph OIDC userinfo |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use super::{AuthError, OAuthProfile, Provider};
use crate::config::{OAuthClientCredentials, OAuthConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const CLIENT_USER_AGENT: &str = concat!("fittrack-server/", env!("CARGO_PKG_VERSION"));

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITHUB_USER_URL: &str = "https://api.github.com/user";
const GITHUB_EMAILS_URL: &str = "https://api.github.com/user/emails";
const MICROSOFT_USERINFO_URL: &str = "https://graph.microsoft.com/oidc/userinfo";

/// Authorization code returned by the provider's consent screen.
#[derive(Debug, Clone)]
pub struct OAuthGrant {
    pub code: String,
    /// PKCE verifier, when the authorization request carried a challenge.
    pub code_verifier: Option<String>,
}

/// Profile read from the provider, plus the token that read it.
#[derive(Debug, Clone)]
pub struct VerifiedProfile {
    pub profile: OAuthProfile,
    pub access_token: String,
}

#[async_trait]
pub trait ProfileVerifier: Send + Sync {
    /// Redeem `grant` with `provider` and return the profile it vouches for.
    ///
    /// # Errors
    /// `UnknownProvider` when the provider has no client registration;
    /// `OAuthRejected` for any redemption or userinfo failure.
    async fn verify(
        &self,
        provider: Provider,
        grant: &OAuthGrant,
    ) -> Result<VerifiedProfile, AuthError>;
}

#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// OIDC userinfo claims (Google, Microsoft Graph).
#[derive(Debug, Deserialize)]
struct OidcUserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    id: u64,
    #[serde(default)]
    login: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    verified: bool,
}

/// HTTP verifier for the configured providers.
pub struct OAuthClient {
    http: Client,
    config: OAuthConfig,
    base_url: String,
}

impl OAuthClient {
    pub fn new(config: &OAuthConfig, base_url: &Url) -> Result<Self, AuthError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(CLIENT_USER_AGENT)
            .build()
            .map_err(|e| AuthError::Internal(format!("failed to build OAuth HTTP client: {e}")))?;

        Ok(Self {
            http,
            config: config.clone(),
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// Redirect URI registered with the provider for this deployment.
    pub fn redirect_uri(&self, provider: Provider) -> String {
        format!("{}/api/auth/callback/{}", self.base_url, provider.as_str())
    }

    fn token_url(&self, provider: Provider) -> String {
        match provider {
            Provider::Google => GOOGLE_TOKEN_URL.to_string(),
            Provider::Github => GITHUB_TOKEN_URL.to_string(),
            _ => format!(
                "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
                self.config.microsoft_tenant_id
            ),
        }
    }

    async fn redeem_code(
        &self,
        provider: Provider,
        client: &OAuthClientCredentials,
        grant: &OAuthGrant,
    ) -> Result<String, AuthError> {
        let redirect_uri = self.redirect_uri(provider);
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", grant.code.as_str()),
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
        ];
        if let Some(verifier) = grant.code_verifier.as_deref() {
            form.push(("code_verifier", verifier));
        }

        let response = self
            .http
            .post(self.token_url(provider))
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::oauth_rejected(provider, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::oauth_rejected(provider, e))?;

        parse_token_response(status, &body).map_err(|cause| AuthError::oauth_rejected(provider, cause))
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        provider: Provider,
        url: &str,
        access_token: &str,
    ) -> Result<T, AuthError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AuthError::oauth_rejected(provider, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::oauth_rejected(
                provider,
                format!("{url} returned HTTP {}", status.as_u16()),
            ));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| AuthError::oauth_rejected(provider, e))
    }
}

#[async_trait]
impl ProfileVerifier for OAuthClient {
    async fn verify(
        &self,
        provider: Provider,
        grant: &OAuthGrant,
    ) -> Result<VerifiedProfile, AuthError> {
        let client = self
            .config
            .credentials(provider)
            .ok_or_else(|| AuthError::UnknownProvider(provider.as_str().to_string()))?;
        if grant.code.trim().is_empty() {
            return Err(AuthError::oauth_rejected(provider, "authorization code is blank"));
        }

        let access_token = self.redeem_code(provider, client, grant).await?;

        let profile = match provider {
            Provider::Google => {
                let info = self
                    .fetch_json(provider, GOOGLE_USERINFO_URL, &access_token)
                    .await?;
                oidc_profile(provider, info, true)
            }
            Provider::Github => {
                let user: GithubUser = self
                    .fetch_json(provider, GITHUB_USER_URL, &access_token)
                    .await?;
                let emails: Vec<GithubEmail> = if has_text(user.email.as_deref()) {
                    Vec::new()
                } else {
                    self.fetch_json(provider, GITHUB_EMAILS_URL, &access_token)
                        .await?
                };
                github_profile(user, &emails)
            }
            _ => {
                let info = self
                    .fetch_json(provider, MICROSOFT_USERINFO_URL, &access_token)
                    .await?;
                // Graph photo URLs need a bearer token, so they are useless to clients.
                oidc_profile(provider, info, false).map(|p| OAuthProfile { image: None, ..p })
            }
        }
        .map_err(|cause| AuthError::oauth_rejected(provider, cause))?;

        tracing::info!(
            provider = %provider,
            provider_account_id = %profile.provider_account_id,
            "OAuth profile verified"
        );

        Ok(VerifiedProfile {
            profile,
            access_token,
        })
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

/// Extract the access token from a token endpoint reply.
///
/// GitHub reports failures as `200` with an `error` field, so the body is
/// checked before the status.
fn parse_token_response(status: StatusCode, body: &str) -> Result<String, String> {
    let parsed: TokenResponse = serde_json::from_str(body).map_err(|_| {
        format!(
            "token endpoint returned HTTP {} with an unreadable body",
            status.as_u16()
        )
    })?;

    if let Some(error) = parsed.error {
        return Err(match parsed.error_description {
            Some(description) => format!("{error}: {description}"),
            None => error,
        });
    }
    if !status.is_success() {
        return Err(format!("token endpoint returned HTTP {}", status.as_u16()));
    }
    parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "token response has no access_token".to_string())
}

fn oidc_profile(
    provider: Provider,
    info: OidcUserInfo,
    require_verified_email: bool,
) -> Result<OAuthProfile, String> {
    let Some(email) = info.email.filter(|e| !e.trim().is_empty()) else {
        return Err("profile has no email".to_string());
    };
    if require_verified_email && info.email_verified != Some(true) {
        return Err("profile email is not verified".to_string());
    }

    Ok(OAuthProfile {
        provider,
        provider_account_id: info.sub,
        email,
        name: info.name,
        image: info.picture,
    })
}

fn github_profile(user: GithubUser, emails: &[GithubEmail]) -> Result<OAuthProfile, String> {
    let email = user
        .email
        .filter(|e| !e.trim().is_empty())
        .or_else(|| {
            emails
                .iter()
                .find(|e| e.primary && e.verified)
                .map(|e| e.email.clone())
        })
        .ok_or_else(|| "account has no verified primary email".to_string())?;

    Ok(OAuthProfile {
        provider: Provider::Github,
        provider_account_id: user.id.to_string(),
        email,
        name: user.name.or(user.login),
        image: user.avatar_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client_for(config: OAuthConfig) -> OAuthClient {
        OAuthClient::new(&config, &Url::parse("https://fittrack.example.com/").unwrap()).unwrap()
    }

    fn google_only() -> OAuthConfig {
        OAuthConfig {
            google: Some(OAuthClientCredentials {
                client_id: "google-client".into(),
                client_secret: "google-secret".into(),
            }),
            microsoft_tenant_id: "contoso".into(),
            ..Default::default()
        }
    }

    fn grant(code: &str) -> OAuthGrant {
        OAuthGrant {
            code: code.into(),
            code_verifier: None,
        }
    }

    #[test]
    fn redirect_uri_and_token_urls_follow_provider() {
        let client = client_for(google_only());
        assert_eq!(
            client.redirect_uri(Provider::AzureAd),
            "https://fittrack.example.com/api/auth/callback/azure-ad"
        );
        assert_eq!(client.token_url(Provider::Google), GOOGLE_TOKEN_URL);
        assert_eq!(
            client.token_url(Provider::AzureAd),
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/token"
        );
    }

    #[tokio::test]
    async fn unregistered_provider_is_unknown() {
        let err = client_for(google_only())
            .verify(Provider::Github, &grant("code-123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownProvider(p) if p == "github"));
    }

    #[tokio::test]
    async fn blank_code_is_rejected_before_any_request() {
        let err = client_for(google_only())
            .verify(Provider::Google, &grant("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::OAuthRejected { .. }));
    }

    #[test]
    fn token_reply_errors_win_over_status() {
        let github_failure = r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#;
        assert_eq!(
            parse_token_response(StatusCode::OK, github_failure).unwrap_err(),
            "bad_verification_code: The code passed is incorrect or expired."
        );
        assert!(parse_token_response(StatusCode::BAD_GATEWAY, "<html>").is_err());
        assert!(parse_token_response(StatusCode::OK, r#"{"token_type":"bearer"}"#).is_err());
        assert_eq!(
            parse_token_response(StatusCode::OK, r#"{"access_token":"ya29.abc"}"#).unwrap(),
            "ya29.abc"
        );
    }

    #[test]
    fn google_profile_requires_verified_email() {
        let info = |verified: bool| -> OidcUserInfo {
            serde_json::from_value(json!({
                "sub": "1098",
                "email": "pat@example.com",
                "email_verified": verified,
                "name": "Pat",
                "picture": "https://lh3.example.com/p.png"
            }))
            .unwrap()
        };

        let profile = oidc_profile(Provider::Google, info(true), true).unwrap();
        assert_eq!(profile.provider_account_id, "1098");
        assert_eq!(profile.email, "pat@example.com");
        assert_eq!(profile.image.as_deref(), Some("https://lh3.example.com/p.png"));

        assert!(oidc_profile(Provider::Google, info(false), true).is_err());
    }

    #[test]
    fn oidc_profile_without_email_is_rejected() {
        let info: OidcUserInfo = serde_json::from_value(json!({ "sub": "abc" })).unwrap();
        assert!(oidc_profile(Provider::AzureAd, info, false).is_err());
    }

    #[test]
    fn github_profile_falls_back_to_primary_verified_email() {
        let user: GithubUser = serde_json::from_value(json!({
            "id": 583231,
            "login": "octocat",
            "name": null,
            "email": null,
            "avatar_url": "https://avatars.example.com/u/583231"
        }))
        .unwrap();
        let emails: Vec<GithubEmail> = serde_json::from_value(json!([
            { "email": "old@example.com", "primary": false, "verified": true },
            { "email": "octo@example.com", "primary": true, "verified": true }
        ]))
        .unwrap();

        let profile = github_profile(user, &emails).unwrap();
        assert_eq!(profile.provider_account_id, "583231");
        assert_eq!(profile.email, "octo@example.com");
        assert_eq!(profile.name.as_deref(), Some("octocat"));
    }

    #[test]
    fn github_profile_ignores_unverified_addresses() {
        let user: GithubUser =
            serde_json::from_value(json!({ "id": 1, "email": "" })).unwrap();
        let emails: Vec<GithubEmail> = serde_json::from_value(json!([
            { "email": "pat@example.com", "primary": true, "verified": false }
        ]))
        .unwrap();
        assert!(github_profile(user, &emails).is_err());
    }
}
