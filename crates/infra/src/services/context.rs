use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use cloudgate_core::SettingsProvider;
use cloudgate_domain::settings_keys;
use cloudgate_domain::{CloudflareError, Result};

use crate::cache::VersionedCache;
use crate::http::CloudflareClient;

/// Shared dependencies handed to every service.
///
/// Services never reach into ambient state: the zone and account scope
/// come either from an explicit argument or from the injected settings
/// provider, and cache access goes through the shared [`VersionedCache`].
#[derive(Clone)]
pub struct ServiceContext {
    client: Arc<CloudflareClient>,
    settings: Arc<dyn SettingsProvider>,
    cache: Arc<VersionedCache>,
}

impl ServiceContext {
    pub fn new(
        client: Arc<CloudflareClient>,
        settings: Arc<dyn SettingsProvider>,
        cache: Arc<VersionedCache>,
    ) -> Self {
        Self {
            client,
            settings,
            cache,
        }
    }

    pub fn client(&self) -> &CloudflareClient {
        &self.client
    }

    pub fn settings(&self) -> &Arc<dyn SettingsProvider> {
        &self.settings
    }

    /// Resolves the zone scope: an explicit argument wins, otherwise the
    /// configured `cloudflare_zone_id` setting. Blank values count as absent.
    pub fn ensure_zone_id(&self, zone_id: Option<&str>) -> Result<String> {
        self.ensure_scope(
            zone_id,
            settings_keys::ZONE_ID,
            CloudflareError::missing_zone_id,
        )
    }

    /// Resolves the account scope the same way as [`Self::ensure_zone_id`].
    pub fn ensure_account_id(&self, account_id: Option<&str>) -> Result<String> {
        self.ensure_scope(
            account_id,
            settings_keys::ACCOUNT_ID,
            CloudflareError::missing_account_id,
        )
    }

    fn ensure_scope(
        &self,
        explicit: Option<&str>,
        key: &str,
        missing: fn() -> CloudflareError,
    ) -> Result<String> {
        if let Some(value) = explicit {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
        self.settings
            .get(key)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(missing)
    }

    pub async fn remember<T, F, Fut>(&self, group: &str, suffix: &str, producer: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.cache.remember(group, suffix, producer).await
    }

    pub fn invalidate(&self, group: &str) {
        self.cache.invalidate(group);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::stores::MemoryStore;
    use crate::settings::{CacheConfig, StaticSettingsProvider};

    fn context_with(settings: StaticSettingsProvider) -> ServiceContext {
        let settings: Arc<dyn SettingsProvider> = Arc::new(settings);
        let auth = Arc::new(crate::auth::CredentialResolver::new(Arc::clone(&settings)));
        let client = Arc::new(CloudflareClient::new(auth).unwrap());
        let cache = Arc::new(VersionedCache::new(
            Arc::new(MemoryStore::new()),
            CacheConfig::default(),
        ));
        ServiceContext::new(client, settings, cache)
    }

    #[test]
    fn explicit_zone_wins_over_settings() {
        let ctx = context_with(
            StaticSettingsProvider::new().set(settings_keys::ZONE_ID, "configured-zone"),
        );
        assert_eq!(ctx.ensure_zone_id(Some("explicit")).unwrap(), "explicit");
        assert_eq!(ctx.ensure_zone_id(None).unwrap(), "configured-zone");
    }

    #[test]
    fn blank_zone_falls_back_to_settings() {
        let ctx =
            context_with(StaticSettingsProvider::new().set(settings_keys::ZONE_ID, "zone-123"));
        assert_eq!(ctx.ensure_zone_id(Some("  ")).unwrap(), "zone-123");
    }

    #[test]
    fn missing_zone_is_a_configuration_error() {
        let ctx = context_with(StaticSettingsProvider::new());
        let err = ctx.ensure_zone_id(None).unwrap_err();
        assert!(matches!(err, CloudflareError::Configuration(_)));
    }

    #[test]
    fn account_id_resolution() {
        let ctx = context_with(
            StaticSettingsProvider::new().set(settings_keys::ACCOUNT_ID, "acct-9"),
        );
        assert_eq!(ctx.ensure_account_id(None).unwrap(), "acct-9");
        assert!(context_with(StaticSettingsProvider::new())
            .ensure_account_id(None)
            .is_err());
    }
}
