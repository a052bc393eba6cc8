//! Credential resolution
//!
//! Resolves which Cloudflare authentication scheme to use and produces the
//! request headers for it. A bearer token always wins over the legacy
//! email + API key pair; exactly one scheme is attached per request, a
//! contract the HTTP layer depends on.

use std::sync::Arc;

use cloudgate_core::SettingsProvider;
use cloudgate_domain::{settings_keys, CloudflareError, Result};
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

const X_AUTH_EMAIL: HeaderName = HeaderName::from_static("x-auth-email");
const X_AUTH_KEY: HeaderName = HeaderName::from_static("x-auth-key");

#[derive(Debug, Default, Clone)]
struct CredentialState {
    email: Option<String>,
    api_key: Option<String>,
    token: Option<String>,
    manually_set: bool,
}

/// Resolves credentials from a settings source and builds auth headers.
///
/// Credentials load lazily from the settings provider on construction and
/// on [`refresh_credentials`](Self::refresh_credentials); a manual
/// [`set_credentials`](Self::set_credentials) override holds until the
/// next refresh, which re-reads the backing source and discards it.
pub struct CredentialResolver {
    settings: Arc<dyn SettingsProvider>,
    state: RwLock<CredentialState>,
}

impl CredentialResolver {
    pub fn new(settings: Arc<dyn SettingsProvider>) -> Self {
        let resolver = Self { settings, state: RwLock::new(CredentialState::default()) };
        resolver.refresh_credentials();
        resolver
    }

    /// Re-read credentials from the settings source.
    ///
    /// Discards any manually-set override; callers that set credentials
    /// in-process see that as a visible side effect.
    pub fn refresh_credentials(&self) {
        let state = CredentialState {
            email: non_empty(self.settings.get(settings_keys::EMAIL)),
            api_key: non_empty(self.settings.get(settings_keys::API_KEY)),
            token: non_empty(self.settings.get(settings_keys::TOKEN)),
            manually_set: false,
        };
        debug!(
            has_token = state.token.is_some(),
            has_key_pair = state.email.is_some() && state.api_key.is_some(),
            "refreshed Cloudflare credentials"
        );
        *self.state.write() = state;
    }

    /// Override credentials in-process without touching the backing store.
    pub fn set_credentials(
        &self,
        email: Option<String>,
        api_key: Option<String>,
        token: Option<String>,
    ) {
        *self.state.write() = CredentialState {
            email: non_empty(email),
            api_key: non_empty(api_key),
            token: non_empty(token),
            manually_set: true,
        };
    }

    /// True iff at least one complete auth scheme is present.
    pub fn has_credentials(&self) -> bool {
        let state = self.state.read();
        state.token.is_some() || (state.email.is_some() && state.api_key.is_some())
    }

    /// Build the header set for the active auth scheme.
    ///
    /// Always includes `Content-Type: application/json`. A bearer token
    /// adds only `Authorization`; otherwise a complete email + key pair
    /// adds only the `X-Auth-*` headers; otherwise nothing further.
    pub fn auth_headers(&self) -> Result<HeaderMap> {
        let state = self.state.read();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &state.token {
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        } else if let (Some(email), Some(api_key)) = (&state.email, &state.api_key) {
            headers.insert(X_AUTH_EMAIL, header_value(email)?);
            headers.insert(X_AUTH_KEY, header_value(api_key)?);
        }

        Ok(headers)
    }

    pub fn email(&self) -> Option<String> {
        self.state.read().email.clone()
    }

    pub fn api_key(&self) -> Option<String> {
        self.state.read().api_key.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    /// Whether the current credentials came from `set_credentials`.
    pub fn manually_set(&self) -> bool {
        self.state.read().manually_set
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        CloudflareError::Configuration(
            "Cloudflare credential contains characters that are invalid in an HTTP header".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::StaticSettingsProvider;

    fn resolver_with(settings: StaticSettingsProvider) -> CredentialResolver {
        CredentialResolver::new(Arc::new(settings))
    }

    #[test]
    fn token_takes_precedence_over_key_pair() {
        let resolver = resolver_with(
            StaticSettingsProvider::default()
                .set(settings_keys::TOKEN, "tok-1")
                .set(settings_keys::EMAIL, "admin@example.com")
                .set(settings_keys::API_KEY, "key-1"),
        );

        let headers = resolver.auth_headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok-1");
        assert!(headers.get(X_AUTH_EMAIL).is_none());
        assert!(headers.get(X_AUTH_KEY).is_none());
        assert!(resolver.has_credentials());
    }

    #[test]
    fn key_pair_used_when_token_absent() {
        let resolver = resolver_with(
            StaticSettingsProvider::default()
                .set(settings_keys::EMAIL, "admin@example.com")
                .set(settings_keys::API_KEY, "key-1"),
        );

        let headers = resolver.auth_headers().unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get(X_AUTH_EMAIL).unwrap(), "admin@example.com");
        assert_eq!(headers.get(X_AUTH_KEY).unwrap(), "key-1");
        assert!(resolver.has_credentials());
    }

    #[test]
    fn incomplete_key_pair_adds_only_content_type() {
        let resolver =
            resolver_with(StaticSettingsProvider::default().set(settings_keys::EMAIL, "admin@example.com"));

        let headers = resolver.auth_headers().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert!(!resolver.has_credentials());
    }

    #[test]
    fn empty_strings_are_treated_as_absent() {
        let resolver = resolver_with(
            StaticSettingsProvider::default()
                .set(settings_keys::TOKEN, "")
                .set(settings_keys::EMAIL, "admin@example.com")
                .set(settings_keys::API_KEY, "key-1"),
        );

        let headers = resolver.auth_headers().unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.get(X_AUTH_EMAIL).unwrap(), "admin@example.com");
    }

    #[test]
    fn refresh_discards_manual_override() {
        let resolver =
            resolver_with(StaticSettingsProvider::default().set(settings_keys::TOKEN, "from-settings"));

        resolver.set_credentials(None, None, Some("manual".into()));
        assert!(resolver.manually_set());
        assert_eq!(resolver.token().as_deref(), Some("manual"));

        resolver.refresh_credentials();
        assert!(!resolver.manually_set());
        assert_eq!(resolver.token().as_deref(), Some("from-settings"));
    }
}
