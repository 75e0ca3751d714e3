// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Identity records and sign-in providers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use utoipa::ToSchema;

/// Sign-in method that produced a session.
///
/// Serialized with the upstream provider ids (`azure-ad` for Microsoft).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub enum Provider {
    #[serde(rename = "credentials")]
    Credentials,
    #[serde(rename = "google")]
    Google,
    #[serde(rename = "github")]
    Github,
    #[serde(rename = "azure-ad")]
    AzureAd,
}

impl Provider {
    pub const OAUTH: [Provider; 3] = [Provider::Google, Provider::Github, Provider::AzureAd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Credentials => "credentials",
            Provider::Google => "google",
            Provider::Github => "github",
            Provider::AzureAd => "azure-ad",
        }
    }

    /// Human-readable name for sign-in buttons.
    pub fn display_name(&self) -> &'static str {
        match self {
            Provider::Credentials => "Email",
            Provider::Google => "Google",
            Provider::Github => "GitHub",
            Provider::AzureAd => "Microsoft",
        }
    }

    pub fn is_oauth(&self) -> bool {
        !matches!(self, Provider::Credentials)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credentials" => Ok(Provider::Credentials),
            "google" => Ok(Provider::Google),
            "github" => Ok(Provider::Github),
            "azure-ad" | "microsoft" => Ok(Provider::AzureAd),
            _ => Err(()),
        }
    }
}

/// The application's durable representation of a user, keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Provider that created this identity.
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the `users` table.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewIdentity {
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub provider: Provider,
}

/// Canonical form of an email used as the identity key.
///
/// Trims, applies Unicode NFKC, and lower-cases. Returns `None` for input
/// that is blank or lacks a non-empty local part and domain.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email: String = raw.trim().nfkc().collect::<String>().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(email)
}
