//! Settings port for credential and identifier resolution.
//!
//! The gateway never reads ambient process-wide configuration directly;
//! every component that needs credentials or identifiers is handed an
//! explicit provider. Production wiring layers environment variables over
//! an encrypted-at-rest store; tests use a static map.

/// Port for resolving string settings by key.
///
/// Keys are the `cloudflare_*` constants in
/// [`cloudgate_domain::settings_keys`]. Implementations return `None` for
/// unknown keys; callers treat empty strings as absent.
pub trait SettingsProvider: Send + Sync {
    /// Resolve a setting, or `None` when it is not configured.
    fn get(&self, key: &str) -> Option<String>;
}
