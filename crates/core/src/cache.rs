//! Time-boxed in-memory cache for API responses
//!
//! Entries are JSON values stamped with the time they were written. A read
//! returns the value only while it is younger than the configured TTL (one
//! hour by default). Expired entries are not removed on read: they stay in the
//! map until overwritten, cleared, or purged explicitly. There is no size
//! bound and no background sweep.
//!
//! The cache is an ordinary value. Share it with `Arc<TtlCache>` and give it a
//! [`ManualClock`](crate::clock::ManualClock) in tests.
//!
//! # Example
//!
//! ```rust
//! use farmacia_core::cache::{cache_key, CacheConfig, TtlCache};
//! use serde_json::json;
//!
//! let cache = TtlCache::new(CacheConfig::default());
//! let key = cache_key("products", &json!({ "limit": 12 }));
//!
//! cache.set(&key, json!([{ "id": "1" }]));
//! assert!(cache.get(&key).is_some());
//!
//! cache.clear(Some("products"));
//! assert!(cache.get(&key).is_none());
//! ```

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::trace;

/// Default time-to-live: one hour
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long an entry stays readable after it is written, in milliseconds
    pub ttl_millis: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

impl CacheConfig {
    /// Configuration with a custom TTL
    ///
    /// Sub-millisecond TTLs round up to one millisecond. A zero TTL makes
    /// every entry expire as soon as it is written.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let ttl_millis = if millis == 0 && !ttl.is_zero() { 1 } else { millis };
        Self { ttl_millis }
    }

    /// TTL as a duration
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_millis)
    }
}

/// A stored value and its write time
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: u64,
}

/// Process-wide key/value cache with lazy expiry
pub struct TtlCache {
    ttl_millis: u64,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl_millis", &self.ttl_millis)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl TtlCache {
    /// Create a cache backed by the system clock
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit time source
    #[must_use]
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl_millis: config.ttl_millis,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a value if it is still fresh
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now_millis();
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        let entry = guard.get(key)?;
        if self.is_expired(entry, now) {
            trace!(key, "cache entry expired");
            return None;
        }
        Some(entry.value.clone())
    }

    /// Get a fresh value and deserialize it
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Store a value, replacing any previous entry for the key
    pub fn set(&self, key: &str, value: Value) {
        let entry = CacheEntry {
            value,
            stored_at: self.clock.now_millis(),
        };
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_string(), entry);
    }

    /// Serialize and store a value
    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value);
        Ok(())
    }

    /// Remove a single entry, returning whether it existed
    pub fn remove(&self, key: &str) -> bool {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(key).is_some()
    }

    /// Remove entries whose key contains `pattern`, or everything when no
    /// pattern is given. Returns the number of entries removed.
    pub fn clear(&self, pattern: Option<&str>) -> usize {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        match pattern {
            Some(pattern) => guard.retain(|key, _| !key.contains(pattern)),
            None => guard.clear(),
        }
        before - guard.len()
    }

    /// Drop every expired entry. Never called implicitly.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, entry| !self.is_expired(entry, now));
        before - guard.len()
    }

    /// Number of stored entries, expired ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a key is physically present, fresh or not
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_millis();
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let expired_entries = guard
            .values()
            .filter(|entry| self.is_expired(entry, now))
            .count();

        CacheStats {
            total_entries: guard.len(),
            expired_entries,
            ttl_secs: self.ttl_millis / 1000,
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: u64) -> bool {
        now.saturating_sub(entry.stored_at) >= self.ttl_millis
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Stored entries, expired ones included
    pub total_entries: usize,
    /// Entries past their TTL that are still stored
    pub expired_entries: usize,
    /// Configured TTL in seconds
    pub ttl_secs: u64,
}

/// Build a cache key from an endpoint name and its query parameters
#[must_use]
pub fn cache_key<P: Serialize + ?Sized>(endpoint: &str, params: &P) -> String {
    let params = serde_json::to_string(params).unwrap_or_default();
    format!("{endpoint}:{params}")
}
