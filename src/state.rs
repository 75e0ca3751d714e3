// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

use std::sync::Arc;

use url::Url;

use crate::ai::{AiError, CompletionClient};
use crate::auth::{
    AuthError, OAuthClient, ProfileVerifier, ProviderRegistry, RedirectPolicy, SessionComposer,
};
use crate::config::{AppConfig, OAuthConfig};
use crate::storage::{
    FitnessStore, HostedBackend, IdentityStore, MemoryBackend, StorageError, UserStore,
};

/// Secret used by [`AppState::default`]; never used when loading from config.
const DEV_SESSION_SECRET: &[u8] = b"fittrack-development-session-secret";
const DEV_BASE_URL: &str = "http://localhost:3000";

/// Which store implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Hosted,
    Memory,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Hosted => "hosted",
            BackendKind::Memory => "memory",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to initialize hosted backend: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to initialize AI client: {0}")]
    Ai(#[from] AiError),

    #[error("failed to initialize OAuth client: {0}")]
    OAuth(#[from] AuthError),
}

#[derive(Clone)]
pub struct AppState {
    pub identities: Arc<dyn IdentityStore>,
    pub users: Arc<dyn UserStore>,
    pub fitness: Arc<dyn FitnessStore>,
    pub backend: BackendKind,
    pub sessions: SessionComposer,
    pub redirects: RedirectPolicy,
    pub providers: ProviderRegistry,
    /// Present when at least one OAuth provider is registered.
    pub oauth: Option<Arc<dyn ProfileVerifier>>,
    pub ai: Option<Arc<CompletionClient>>,
}

impl AppState {
    /// Build state for a loaded configuration.
    ///
    /// Without hosted credentials every store is a single shared
    /// [`MemoryBackend`].
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let redirects = RedirectPolicy::new(config.base_url.clone());
        let sessions = SessionComposer::new(config.session_secret.as_bytes(), redirects.base());
        let providers = ProviderRegistry::from_config(&config.oauth);
        let ai = config
            .ai
            .as_ref()
            .map(CompletionClient::new)
            .transpose()?
            .map(Arc::new);
        let oauth: Option<Arc<dyn ProfileVerifier>> = if config.oauth.is_empty() {
            None
        } else {
            Some(Arc::new(OAuthClient::new(&config.oauth, &config.base_url)?))
        };

        let state = match &config.hosted {
            Some(hosted) => {
                let backend = Arc::new(HostedBackend::new(hosted)?);
                Self {
                    identities: backend.clone(),
                    users: backend.clone(),
                    fitness: backend,
                    backend: BackendKind::Hosted,
                    sessions,
                    redirects,
                    providers,
                    oauth,
                    ai,
                }
            }
            None => Self {
                sessions,
                redirects,
                providers,
                oauth,
                ai,
                ..Self::with_memory(Arc::new(MemoryBackend::new()))
            },
        };
        Ok(state)
    }

    /// Development state over an existing in-memory backend.
    ///
    /// Only email/password sign-in is enabled.
    pub fn with_memory(backend: Arc<MemoryBackend>) -> Self {
        let redirects =
            RedirectPolicy::new(Url::parse(DEV_BASE_URL).expect("DEV_BASE_URL is a valid URL"));
        Self {
            identities: backend.clone(),
            users: backend.clone(),
            fitness: backend,
            backend: BackendKind::Memory,
            sessions: SessionComposer::new(DEV_SESSION_SECRET, redirects.base()),
            redirects,
            providers: ProviderRegistry::from_config(&OAuthConfig::default()),
            oauth: None,
            ai: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_memory(Arc::new(MemoryBackend::new()))
    }
}
