//! Settings providers
//!
//! Production wiring resolves credentials and identifiers from environment
//! variables first, falling back to an injected store (the admin panel
//! keeps operator-entered values encrypted at rest; that store is an
//! external collaborator behind the same [`SettingsProvider`] port).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cloudgate_core::SettingsProvider;
use cloudgate_domain::settings_keys;

/// Default TTL for cached API reads (5 minutes)
///
/// Override via the `CLOUDFLARE_CACHE_TTL` environment variable; 0
/// disables caching.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default cache key prefix
pub const DEFAULT_CACHE_PREFIX: &str = "cloudflare";

/// Response cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live for cached API reads; zero disables caching
    pub ttl: Duration,

    /// Prefix embedded in every cache key
    pub prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(
                std::env::var(settings_keys::ENV_CACHE_TTL)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_CACHE_TTL_SECS),
            ),
            prefix: DEFAULT_CACHE_PREFIX.to_string(),
        }
    }
}

impl CacheConfig {
    /// Create config with a fixed TTL (useful for testing)
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { ttl, prefix: DEFAULT_CACHE_PREFIX.to_string() }
    }

    /// A config with caching disabled entirely.
    pub fn disabled() -> Self {
        Self::with_ttl(Duration::ZERO)
    }
}

/// Environment-backed settings provider with an optional fallback store.
///
/// Each `cloudflare_*` key maps to its `CLOUDFLARE_*` environment
/// variable; a present, non-empty variable wins. Otherwise the fallback
/// provider (if any) is consulted.
pub struct EnvSettingsProvider {
    fallback: Option<Arc<dyn SettingsProvider>>,
}

impl EnvSettingsProvider {
    pub fn new() -> Self {
        Self { fallback: None }
    }

    /// Layer environment variables over a backing store.
    pub fn with_fallback(fallback: Arc<dyn SettingsProvider>) -> Self {
        Self { fallback: Some(fallback) }
    }

    fn env_var_for(key: &str) -> Option<&'static str> {
        match key {
            settings_keys::EMAIL => Some(settings_keys::ENV_EMAIL),
            settings_keys::API_KEY => Some(settings_keys::ENV_API_KEY),
            settings_keys::TOKEN => Some(settings_keys::ENV_TOKEN),
            settings_keys::ZONE_ID => Some(settings_keys::ENV_ZONE_ID),
            settings_keys::ACCOUNT_ID => Some(settings_keys::ENV_ACCOUNT_ID),
            _ => None,
        }
    }
}

impl Default for EnvSettingsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsProvider for EnvSettingsProvider {
    fn get(&self, key: &str) -> Option<String> {
        if let Some(var) = Self::env_var_for(key) {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    return Some(value);
                }
            }
        }

        self.fallback.as_ref().and_then(|f| f.get(key))
    }
}

/// Map-backed settings provider for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticSettingsProvider {
    values: HashMap<String, String>,
}

impl StaticSettingsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn set(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl SettingsProvider for StaticSettingsProvider {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}
