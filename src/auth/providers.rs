// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Sign-in providers enabled for this deployment.

use serde::Serialize;
use utoipa::ToSchema;

use super::Provider;
use crate::config::OAuthConfig;

#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Credentials,
    Oauth,
}

/// Public description of an enabled provider.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: Provider,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ProviderKind,
}

/// Providers accepted by the sign-in endpoints.
///
/// Email/password is always enabled; an OAuth provider is enabled when its
/// client id and secret are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRegistry {
    enabled: Vec<Provider>,
}

impl ProviderRegistry {
    pub fn from_config(oauth: &OAuthConfig) -> Self {
        let mut enabled = vec![Provider::Credentials];
        enabled.extend(
            Provider::OAUTH
                .into_iter()
                .filter(|p| oauth.credentials(*p).is_some()),
        );
        Self { enabled }
    }

    pub fn is_enabled(&self, provider: Provider) -> bool {
        self.enabled.contains(&provider)
    }

    pub fn list(&self) -> Vec<ProviderInfo> {
        self.enabled
            .iter()
            .map(|p| ProviderInfo {
                id: *p,
                name: p.display_name().to_string(),
                kind: if p.is_oauth() {
                    ProviderKind::Oauth
                } else {
                    ProviderKind::Credentials
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OAuthClientCredentials;

    fn registered(id: &str) -> Option<OAuthClientCredentials> {
        Some(OAuthClientCredentials {
            client_id: id.into(),
            client_secret: format!("{id}-secret"),
        })
    }

    #[test]
    fn only_configured_oauth_providers_are_enabled() {
        let registry = ProviderRegistry::from_config(&OAuthConfig {
            github: registered("gh"),
            ..Default::default()
        });

        assert!(registry.is_enabled(Provider::Credentials));
        assert!(registry.is_enabled(Provider::Github));
        assert!(!registry.is_enabled(Provider::Google));
        assert!(!registry.is_enabled(Provider::AzureAd));

        let listed = registry.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[1].name, "GitHub");
        assert_eq!(listed[1].kind, ProviderKind::Oauth);
    }

    #[test]
    fn provider_info_serializes_upstream_ids() {
        let registry = ProviderRegistry::from_config(&OAuthConfig {
            google: registered("g"),
            github: registered("gh"),
            microsoft: registered("ms"),
            microsoft_tenant_id: "common".into(),
        });
        let json = serde_json::to_value(&registry.list()).unwrap();
        assert_eq!(json[3]["id"], "azure-ad");
        assert_eq!(json[3]["type"], "oauth");
        assert_eq!(json[0]["type"], "credentials");
    }
}
