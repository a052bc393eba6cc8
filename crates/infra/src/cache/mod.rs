//! Version-tag response caching
//!
//! Read results are cached under keys that embed a per-group version
//! number. Invalidating a group bumps its version, which makes every
//! previously-written entry unreachable without enumerating or deleting a
//! single data key; entries simply expire via their own TTL. This is what
//! lets one cache layer work over any [`CacheStore`] backend, including
//! ones with no wildcard delete, scan, or tagging support.
//!
//! Key layout:
//! - `{prefix}:v:{group}` → integer version (long-lived)
//! - `{prefix}:{group}:v{N}[:{suffix}]` → cached JSON value (data TTL)

pub mod stores;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cloudgate_core::CacheStore;
use cloudgate_domain::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::settings::CacheConfig;

pub use stores::MemoryStore;

/// The version counter must outlive any data entry it needs to orphan;
/// eviction order between the two must never matter.
const VERSION_TTL: Duration = Duration::from_secs(86_400);

/// Read-through cache with version-bump invalidation.
pub struct VersionedCache {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl VersionedCache {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// Whether caching is active (a zero TTL disables it entirely).
    pub fn is_enabled(&self) -> bool {
        !self.config.ttl.is_zero()
    }

    /// Read-through fetch for `group` (+ optional `suffix` for variants
    /// within the group, e.g. pagination).
    ///
    /// With caching disabled every call invokes the producer directly,
    /// a fully supported mode, not a degraded one. Otherwise the group
    /// version and effective key are read together on every call, so a
    /// value produced under one version is never stored under another.
    pub async fn remember<T, F, Fut>(&self, group: &str, suffix: &str, producer: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.is_enabled() {
            return producer().await;
        }

        let version = self.current_version(group);
        let key = self.data_key(group, version, suffix);

        if let Some(cached) = self.store.get(&key) {
            match serde_json::from_value(cached) {
                Ok(value) => {
                    trace!(group, key, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    // Stale shape from an older build; treat as a miss.
                    debug!(group, key, error = %e, "cached value failed to deserialize");
                }
            }
        }

        debug!(group, key, "cache miss");
        let produced = producer().await?;

        match serde_json::to_value(&produced) {
            Ok(json) => self.store.put(&key, json, self.config.ttl),
            Err(e) => {
                // Never fail the operation over a cache write.
                warn!(group, key, error = %e, "failed to serialize value for cache");
            }
        }

        Ok(produced)
    }

    /// Invalidate every entry in a group by incrementing its version.
    ///
    /// Old entries are never read again and expire naturally via TTL.
    pub fn invalidate(&self, group: &str) {
        if !self.is_enabled() {
            return;
        }

        let version = self.store.increment(&self.version_key(group), VERSION_TTL);
        debug!(group, version, "cache group invalidated");
    }

    fn current_version(&self, group: &str) -> u64 {
        self.store.get(&self.version_key(group)).and_then(|v| v.as_u64()).unwrap_or(0)
    }

    fn version_key(&self, group: &str) -> String {
        format!("{}:v:{}", self.config.prefix, group)
    }

    fn data_key(&self, group: &str, version: u64, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("{}:{}:v{}", self.config.prefix, group, version)
        } else {
            format!("{}:{}:v{}:{}", self.config.prefix, group, version, suffix)
        }
    }
}
