// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup into an [`AppConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `APP_BASE_URL` | Canonical public URL of the web app | `http://localhost:3000` |
//! | `SESSION_SECRET` | HS256 secret for session tokens (>= 32 bytes) | Random per process (dev only) |
//! | `SUPABASE_URL` | Hosted identity + relational backend | In-memory backend |
//! | `SUPABASE_ANON_KEY` | API key for the hosted backend | Required with `SUPABASE_URL` |
//! | `DEEPSEEK_API_URL` | AI completion endpoint base | AI disabled |
//! | `DEEPSEEK_API_KEY` | AI completion API key | AI disabled |
//! | `DEEPSEEK_MODEL` | AI model name | `deepseek-chat` |
//! | `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` | Enables Google sign-in (both or neither) | Disabled |
//! | `GITHUB_ID` / `GITHUB_SECRET` | Enables GitHub sign-in (both or neither) | Disabled |
//! | `MICROSOFT_CLIENT_ID` / `MICROSOFT_CLIENT_SECRET` | Enables Microsoft (Azure AD) sign-in (both or neither) | Disabled |
//! | `MICROSOFT_TENANT_ID` | Azure AD tenant | `common` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `fittrack_server=info,tower_http=debug,info` |

use std::env;

use url::Url;
use uuid::Uuid;

use crate::auth::Provider;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const APP_BASE_URL_ENV: &str = "APP_BASE_URL";
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const DEEPSEEK_API_URL_ENV: &str = "DEEPSEEK_API_URL";
pub const DEEPSEEK_API_KEY_ENV: &str = "DEEPSEEK_API_KEY";
pub const DEEPSEEK_MODEL_ENV: &str = "DEEPSEEK_MODEL";
pub const GOOGLE_CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
pub const GOOGLE_CLIENT_SECRET_ENV: &str = "GOOGLE_CLIENT_SECRET";
pub const GITHUB_ID_ENV: &str = "GITHUB_ID";
pub const GITHUB_SECRET_ENV: &str = "GITHUB_SECRET";
pub const MICROSOFT_CLIENT_ID_ENV: &str = "MICROSOFT_CLIENT_ID";
pub const MICROSOFT_CLIENT_SECRET_ENV: &str = "MICROSOFT_CLIENT_SECRET";
pub const MICROSOFT_TENANT_ID_ENV: &str = "MICROSOFT_TENANT_ID";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_MODEL: &str = "deepseek-chat";
const DEFAULT_TENANT: &str = "common";

/// Minimum accepted length of `SESSION_SECRET`, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not a valid port number")]
    InvalidPort(String),

    #[error("{var} is not a valid absolute URL: {value}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,

    #[error("{present} is set but {missing} is not")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Connection settings for the hosted identity + relational backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedBackendConfig {
    pub url: Url,
    pub api_key: String,
}

/// Connection settings for the AI completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub api_url: Url,
    pub api_key: String,
    pub model: String,
}

/// Client registration with one OAuth provider.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for OAuthClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// OAuth client registrations; a provider is offered only when it has one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthConfig {
    pub google: Option<OAuthClientCredentials>,
    pub github: Option<OAuthClientCredentials>,
    pub microsoft: Option<OAuthClientCredentials>,
    pub microsoft_tenant_id: String,
}

impl OAuthConfig {
    pub fn credentials(&self, provider: Provider) -> Option<&OAuthClientCredentials> {
        match provider {
            Provider::Google => self.google.as_ref(),
            Provider::Github => self.github.as_ref(),
            Provider::AzureAd => self.microsoft.as_ref(),
            Provider::Credentials => None,
        }
    }

    /// True when no OAuth provider is configured.
    pub fn is_empty(&self) -> bool {
        self.google.is_none() && self.github.is_none() && self.microsoft.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub base_url: Url,
    pub session_secret: String,
    /// True when `SESSION_SECRET` was absent and a throwaway secret was generated.
    pub ephemeral_secret: bool,
    pub hosted: Option<HostedBackendConfig>,
    pub ai: Option<AiConfig>,
    pub oauth: OAuthConfig,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let base_url = parse_url(
            APP_BASE_URL_ENV,
            &get(APP_BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        )?;

        let (session_secret, ephemeral_secret) = match get(SESSION_SECRET_ENV) {
            Some(secret) if secret.len() < MIN_SECRET_LEN => return Err(ConfigError::WeakSecret),
            Some(secret) => (secret, false),
            None => (
                format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
                true,
            ),
        };

        let hosted = match (get(SUPABASE_URL_ENV), get(SUPABASE_ANON_KEY_ENV)) {
            (Some(url), Some(api_key)) => Some(HostedBackendConfig {
                url: parse_url(SUPABASE_URL_ENV, &url)?,
                api_key,
            }),
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    present: SUPABASE_URL_ENV,
                    missing: SUPABASE_ANON_KEY_ENV,
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete {
                    present: SUPABASE_ANON_KEY_ENV,
                    missing: SUPABASE_URL_ENV,
                })
            }
            (None, None) => None,
        };

        let ai = match (get(DEEPSEEK_API_URL_ENV), get(DEEPSEEK_API_KEY_ENV)) {
            (Some(url), Some(api_key)) => Some(AiConfig {
                api_url: parse_url(DEEPSEEK_API_URL_ENV, &url)?,
                api_key,
                model: get(DEEPSEEK_MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            }),
            (Some(_), None) => {
                return Err(ConfigError::Incomplete {
                    present: DEEPSEEK_API_URL_ENV,
                    missing: DEEPSEEK_API_KEY_ENV,
                })
            }
            _ => None,
        };

        let client = |id_var: &'static str, secret_var: &'static str| match (
            get(id_var),
            get(secret_var),
        ) {
            (Some(client_id), Some(client_secret)) => Ok(Some(OAuthClientCredentials {
                client_id,
                client_secret,
            })),
            (Some(_), None) => Err(ConfigError::Incomplete {
                present: id_var,
                missing: secret_var,
            }),
            (None, Some(_)) => Err(ConfigError::Incomplete {
                present: secret_var,
                missing: id_var,
            }),
            (None, None) => Ok(None),
        };

        let oauth = OAuthConfig {
            google: client(GOOGLE_CLIENT_ID_ENV, GOOGLE_CLIENT_SECRET_ENV)?,
            github: client(GITHUB_ID_ENV, GITHUB_SECRET_ENV)?,
            microsoft: client(MICROSOFT_CLIENT_ID_ENV, MICROSOFT_CLIENT_SECRET_ENV)?,
            microsoft_tenant_id: get(MICROSOFT_TENANT_ID_ENV)
                .unwrap_or_else(|| DEFAULT_TENANT.to_string()),
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            host,
            port,
            base_url,
            session_secret,
            ephemeral_secret,
            hosted,
            ai,
            oauth,
            log_format,
        })
    }
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.base_url.as_str(), "http://localhost:3000/");
        assert!(config.ephemeral_secret);
        assert!(config.session_secret.len() >= MIN_SECRET_LEN);
        assert!(config.hosted.is_none());
        assert!(config.ai.is_none());
        assert_eq!(config.oauth.microsoft_tenant_id, "common");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn rejects_short_secret() {
        let err = load(&[(SESSION_SECRET_ENV, "short")]).unwrap_err();
        assert_eq!(err, ConfigError::WeakSecret);
    }

    #[test]
    fn rejects_half_configured_backend() {
        let err = load(&[(SUPABASE_URL_ENV, "https://db.example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::Incomplete { .. }));
    }

    #[test]
    fn oauth_client_id_requires_its_secret() {
        let err = load(&[(GOOGLE_CLIENT_ID_ENV, "google-client")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Incomplete {
                present: GOOGLE_CLIENT_ID_ENV,
                missing: GOOGLE_CLIENT_SECRET_ENV,
            }
        );
        assert!(matches!(
            load(&[(MICROSOFT_CLIENT_SECRET_ENV, "secret")]),
            Err(ConfigError::Incomplete { .. })
        ));
    }

    #[test]
    fn rejects_bad_port_and_url() {
        assert!(matches!(
            load(&[(PORT_ENV, "eighty")]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            load(&[(APP_BASE_URL_ENV, "not a url")]),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn reads_full_configuration() {
        let config = load(&[
            (PORT_ENV, "9000"),
            (APP_BASE_URL_ENV, "https://app.example.com"),
            (SESSION_SECRET_ENV, "0123456789abcdef0123456789abcdef"),
            (SUPABASE_URL_ENV, "https://db.example.com"),
            (SUPABASE_ANON_KEY_ENV, "anon"),
            (DEEPSEEK_API_URL_ENV, "https://ai.example.com/v1"),
            (DEEPSEEK_API_KEY_ENV, "sk-test"),
            (GITHUB_ID_ENV, "gh-client"),
            (GITHUB_SECRET_ENV, "gh-secret"),
            (LOG_FORMAT_ENV, "JSON"),
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert!(!config.ephemeral_secret);
        assert_eq!(config.hosted.unwrap().api_key, "anon");
        assert_eq!(config.ai.unwrap().model, "deepseek-chat");
        let github = config.oauth.credentials(Provider::Github).unwrap();
        assert_eq!(github.client_id, "gh-client");
        assert_eq!(github.client_secret, "gh-secret");
        assert!(!format!("{github:?}").contains("gh-secret"));
        assert!(config.oauth.google.is_none());
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
