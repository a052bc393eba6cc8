//! In-memory cache store backed by moka
//!
//! The default backend for the versioned cache. Each entry carries its own
//! TTL (the version counter lives much longer than the data entries it
//! orphans), so the cache uses a per-entry expiry policy instead of a
//! cache-wide time-to-live.

use std::time::{Duration, Instant};

use cloudgate_core::CacheStore;
use moka::sync::Cache;
use moka::Expiry;
use parking_lot::Mutex;
use serde_json::Value;

/// Default max capacity (10k entries)
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct CacheEntry {
    value: Value,
    ttl: Duration,
}

struct PerEntryExpiry;

impl Expiry<String, CacheEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Process-local cache store.
pub struct MemoryStore {
    cache: Cache<String, CacheEntry>,
    // Serializes read-modify-write counter bumps within this process.
    increment_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_capacity(DEFAULT_MAX_CAPACITY)
    }

    pub fn with_max_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();
        Self { cache, increment_lock: Mutex::new(()) }
    }

    /// Number of live entries (runs pending moka housekeeping first).
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.cache.get(key).map(|entry| entry.value)
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) {
        self.cache.insert(key.to_string(), CacheEntry { value, ttl });
    }

    fn increment(&self, key: &str, ttl: Duration) -> u64 {
        let _guard = self.increment_lock.lock();
        let next = self.get(key).and_then(|v| v.as_u64()).unwrap_or(0) + 1;
        self.put(key, Value::from(next), ttl);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let store = MemoryStore::new();
        store.put("k1", Value::from("v1"), Duration::from_secs(60));

        assert_eq!(store.get("k1"), Some(Value::from("v1")));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn entries_expire_after_their_own_ttl() {
        let store = MemoryStore::new();
        store.put("short", Value::from(1), Duration::from_millis(20));
        store.put("long", Value::from(2), Duration::from_secs(60));

        std::thread::sleep(Duration::from_millis(60));

        assert_eq!(store.get("short"), None);
        assert_eq!(store.get("long"), Some(Value::from(2)));
    }

    #[test]
    fn increment_starts_at_one_and_counts_up() {
        let store = MemoryStore::new();

        assert_eq!(store.increment("counter", Duration::from_secs(60)), 1);
        assert_eq!(store.increment("counter", Duration::from_secs(60)), 2);
        assert_eq!(store.get("counter"), Some(Value::from(2)));
    }
}
