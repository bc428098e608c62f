//! Durable local key/value store.
//!
//! Every piece of client-side state (cart, session, homepage snapshot,
//! response cache) is kept as one JSON text record under a fixed key.
//! Owners read and write their own record directly; there is no locking
//! across records.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Fixed record names.
pub mod keys {
    /// Serialized cart line list.
    pub const CART: &str = "cart";
    /// Serialized authenticated user (absent = logged out).
    pub const USER: &str = "user";
    /// Serialized homepage sections plus timestamp.
    pub const HOME_SNAPSHOT: &str = "home_snapshot";
    /// Serialized outbound-call cache table.
    pub const API_CACHE: &str = "api_cache";
}

/// Errors from the durable store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage quota exceeded writing '{key}': {size} bytes (quota {quota})")]
    QuotaExceeded {
        key: String,
        size: usize,
        quota: usize,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Trait for the durable key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a record. Returns `None` if it was never written or was removed.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write (overwrite) a record.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a record. Removing a missing record is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read a record and decode it as JSON.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(text) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| StoreError::Serialization(format!("{}: {}", key, e))),
        None => Ok(None),
    }
}

/// Encode a value as JSON and write it.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let text = serde_json::to_string(value)
        .map_err(|e| StoreError::Serialization(format!("{}: {}", key, e)))?;
    store.set(key, &text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u32,
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        let record = Record {
            name: "x".to_string(),
            count: 3,
        };

        save_json(&store, "r", &record).unwrap();
        let loaded: Option<Record> = load_json(&store, "r").unwrap();
        assert_eq!(loaded, Some(record));

        let missing: Option<Record> = load_json(&store, "missing").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_load_json_corrupt_record() {
        let store = MemoryStore::new();
        store.set("r", "{not json").unwrap();

        let result: Result<Option<Record>, _> = load_json(&store, "r");
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
