//! Proof-result caching keyed by request fingerprint.
//!
//! Proof generation is expensive, so successful results are cached under a
//! deterministic fingerprint of (api key, symbol, order id). Entries are
//! never invalidated or evicted; the same triple always maps to the same
//! key, and a stale proof of a historical trade stays valid.

pub mod store;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

pub use store::{FileStore, InMemoryStore, ProofStore};

/// Compute the cache key for a (api key, symbol, order id) triple.
///
/// One-way and deterministic: the hex SHA256 of the concatenated fields.
pub fn fingerprint(api_key: &str, symbol: &str, order_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hasher.update(symbol.as_bytes());
    hasher.update(order_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// A cached proof result with its write timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The cached proof payload, exactly as returned to the caller
    pub data: serde_json::Value,
    /// Unix timestamp (seconds) of the write
    pub cached_at: i64,
}

/// Cache of proof results over an injectable storage backend
pub struct ProofCache {
    store: Box<dyn ProofStore>,
}

impl ProofCache {
    /// Create a cache over the given backend
    pub fn new(store: Box<dyn ProofStore>) -> Self {
        Self { store }
    }

    /// Read the entry for `key`.
    ///
    /// Absent entries return `Ok(None)`. A present but malformed entry is
    /// surfaced as a deserialization error, never treated as a miss: a
    /// corrupt entry means disk damage or a format change, and silently
    /// regenerating the proof would mask it.
    pub fn read(&self, key: &str) -> Result<Option<CacheEntry>> {
        match self.store.get(key)? {
            Some(raw) => {
                let entry: CacheEntry = serde_json::from_str(&raw).map_err(|e| {
                    Error::Deserialization(format!("Malformed cache entry {}: {}", key, e))
                })?;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Write `data` under `key` with the current timestamp, overwriting
    /// any prior entry
    pub fn write(&self, key: &str, data: serde_json::Value) -> Result<()> {
        let entry = CacheEntry {
            data,
            cached_at: chrono::Utc::now().timestamp(),
        };

        let raw = serde_json::to_string(&entry)
            .map_err(|e| Error::Serialization(format!("Failed to serialize cache entry: {}", e)))?;

        self.store.put(key, &raw)
    }
}
