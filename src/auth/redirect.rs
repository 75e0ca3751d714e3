// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FitTrack

//! Post-authentication redirect policy.
//!
//! Rules, first match wins:
//!
//! 1. Target equals the base URL (with or without a trailing slash): base.
//! 2. Target is path-relative (`/...`): base + target.
//! 3. Target is absolute with the base URL's origin: target unchanged.
//! 4. Anything else, including unparseable input: base.

use url::Url;

use super::AuthError;

#[derive(Debug, Clone)]
pub struct RedirectPolicy {
    base: String,
    base_url: Url,
}

impl RedirectPolicy {
    pub fn new(base_url: Url) -> Self {
        let base = base_url.as_str().trim_end_matches('/').to_string();
        Self { base, base_url }
    }

    /// Base URL without trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn is_https(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    /// Resolve an optional requested target.
    pub fn resolve_opt(&self, target: Option<&str>) -> String {
        match target {
            Some(t) => self.resolve(t),
            None => self.base.clone(),
        }
    }

    /// Resolve a requested target to a safe redirect URL.
    pub fn resolve(&self, target: &str) -> String {
        let target = target.trim();

        if target.trim_end_matches('/') == self.base && target.len() <= self.base.len() + 1 {
            return self.base.clone();
        }
        if target.starts_with('/') {
            return format!("{}{}", self.base, target);
        }

        match self.same_origin(target) {
            Ok(true) => target.to_string(),
            Ok(false) => self.base.clone(),
            Err(e) => {
                tracing::debug!(error = %e, "Redirect target ignored");
                self.base.clone()
            }
        }
    }

    fn same_origin(&self, target: &str) -> Result<bool, AuthError> {
        let url = Url::parse(target).map_err(|e| AuthError::MalformedRedirect(e.to_string()))?;
        Ok(url.origin() == self.base_url.origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RedirectPolicy {
        RedirectPolicy::new(Url::parse("https://app.example.com").unwrap())
    }

    #[test]
    fn base_url_with_or_without_trailing_slash() {
        let p = policy();
        assert_eq!(p.resolve("https://app.example.com"), "https://app.example.com");
        assert_eq!(p.resolve("https://app.example.com/"), "https://app.example.com");
    }

    #[test]
    fn relative_paths_are_prefixed() {
        let p = policy();
        assert_eq!(p.resolve("/dashboard"), "https://app.example.com/dashboard");
        assert_eq!(
            p.resolve("/workouts?tab=history"),
            "https://app.example.com/workouts?tab=history"
        );
        // Protocol-relative input stays on our origin.
        assert_eq!(p.resolve("//evil.example.org"), "https://app.example.com//evil.example.org");
    }

    #[test]
    fn same_origin_absolute_urls_pass_through() {
        let p = policy();
        assert_eq!(
            p.resolve("https://app.example.com/profile"),
            "https://app.example.com/profile"
        );
    }

    #[test]
    fn foreign_origins_fall_back_to_base() {
        let p = policy();
        for target in [
            "https://evil.example.org/x",
            "http://app.example.com/profile",
            "https://app.example.com:8443/profile",
            "https://app.example.com.evil.org/",
            "javascript:alert(1)",
        ] {
            assert_eq!(p.resolve(target), "https://app.example.com", "{target}");
        }
    }

    #[test]
    fn malformed_targets_fall_back_to_base() {
        let p = policy();
        for target in ["", "dashboard", "http://", "::::", "https://[bad"] {
            assert_eq!(p.resolve(target), "https://app.example.com", "{target:?}");
        }
        assert_eq!(p.resolve_opt(None), "https://app.example.com");
    }

    #[test]
    fn base_with_path_keeps_path() {
        let p = RedirectPolicy::new(Url::parse("https://example.com/app/").unwrap());
        assert_eq!(p.base(), "https://example.com/app");
        assert_eq!(p.resolve("https://example.com/app/"), "https://example.com/app");
        assert_eq!(p.resolve("/home"), "https://example.com/app/home");
    }
}
