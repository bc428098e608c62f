//! Time-boxed response cache over outbound catalog calls.
//!
//! Entries live in memory and the whole table is mirrored into the durable
//! store after every change. An entry older than the TTL is treated as absent
//! and dropped on the read that notices it, or on the next write. If the
//! durable write fails the in-memory table stays authoritative for the rest
//! of the process.

mod clock;

pub use clock::{Clock, SystemClock};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::metrics::{CACHE_LOOKUPS, PERSIST_FAILURES};
use crate::store::{keys, load_json, save_json, KeyValueStore};

/// Default cache time-to-live (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// A cached payload and the moment it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    data: Value,
    timestamp: DateTime<Utc>,
}

/// Response cache with lazy TTL eviction and write-through persistence.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: chrono::Duration,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    /// Create a cache backed by `store`, restoring any previously persisted table.
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit clock (tests use a manual clock).
    pub fn with_clock(store: Arc<dyn KeyValueStore>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let entries = match load_json::<HashMap<String, CacheEntry>>(store.as_ref(), keys::API_CACHE)
        {
            Ok(Some(entries)) => {
                debug!("Restored {} cache entries", entries.len());
                entries
            }
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!("Error loading cache, starting empty: {}", e);
                HashMap::new()
            }
        };

        Self {
            entries: Mutex::new(entries),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
            store,
            clock,
        }
    }

    /// Look up a payload. Expired entries are evicted and reported as absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.lock();

        let entry = match entries.get(key) {
            Some(entry) => entry,
            None => {
                CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
                return None;
            }
        };

        if self.clock.now() - entry.timestamp > self.ttl {
            debug!("Cache entry expired: {}", key);
            entries.remove(key);
            self.persist(&entries);
            CACHE_LOOKUPS.with_label_values(&["expired"]).inc();
            return None;
        }

        CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
        Some(entry.data.clone())
    }

    /// Store a payload, overwriting any previous entry, and persist the table.
    /// Expired entries are pruned first so the table stays bounded by the TTL.
    pub fn set(&self, key: &str, data: Value) {
        let now = self.clock.now();
        let mut entries = self.lock();

        let before = entries.len();
        entries.retain(|_, entry| now - entry.timestamp <= self.ttl);
        let pruned = before - entries.len();
        if pruned > 0 {
            debug!("Pruned {} expired cache entries", pruned);
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                data,
                timestamp: now,
            },
        );
        self.persist(&entries);
    }

    /// Typed lookup. A payload that no longer decodes counts as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("Ignoring undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Typed store. Values that fail to encode are skipped.
    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(data) => self.set(key, data),
            Err(e) => warn!("Not caching {}: {}", key, e),
        }
    }

    /// Number of entries held, including not-yet-evicted expired ones.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and persist the empty table.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.clear();
        self.persist(&entries);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &HashMap<String, CacheEntry>) {
        if let Err(e) = save_json(self.store.as_ref(), keys::API_CACHE, entries) {
            warn!("Error saving cache: {}", e);
            PERSIST_FAILURES.with_label_values(&[keys::API_CACHE]).inc();
        }
    }
}

/// Build a deterministic cache key from an operation name and its parameters.
pub fn cache_key(operation: &str, params: &[&dyn std::fmt::Display]) -> String {
    let mut key = operation.to_string();
    for param in params {
        key.push('_');
        key.push_str(&param.to_string());
    }
    key
}
