//! Cache store port.
//!
//! The version-tag invalidation scheme only needs point reads and writes,
//! so the contract stays deliberately small: no enumeration, no scans, no
//! wildcard deletes. Any backend that can hold a JSON value under a string
//! key for a bounded lifetime qualifies, which is what lets one gateway
//! work against in-memory, Redis-like, or file-backed stores alike.

use std::time::Duration;

use serde_json::Value;

/// Port for a key/value cache backend.
pub trait CacheStore: Send + Sync {
    /// Read a value, or `None` on miss or expiry.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value for at most `ttl`.
    fn put(&self, key: &str, value: Value, ttl: Duration);

    /// Increment an integer counter and return the new value.
    ///
    /// The default is a read-modify-write over `get`/`put` (missing keys
    /// count as 0). Backends with a native atomic increment should
    /// override this to tighten the race between concurrent invalidations;
    /// the default is still safe, at worst coalescing two concurrent
    /// bumps into one.
    fn increment(&self, key: &str, ttl: Duration) -> u64 {
        let current = self.get(key).and_then(|v| v.as_u64()).unwrap_or(0);
        let next = current + 1;
        self.put(key, Value::from(next), ttl);
        next
    }
}
