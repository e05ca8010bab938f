//! Storage backends for cached proof results.
//!
//! Two backends are provided:
//! - `InMemoryStore`: fast, ephemeral storage for testing
//! - `FileStore`: one JSON file per entry under a flat directory
//!
//! Neither backend evicts or expires entries; growth is unbounded by
//! design and is an accepted operational caveat of this service.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{Error, Result};

/// Trait for proof-result storage backends
pub trait ProofStore: Send + Sync {
    /// Get the raw stored value for a key, if present
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value under a key, overwriting any prior entry
    fn put(&self, key: &str, value: &str) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory storage backend (for testing and ephemeral use)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.data.read().map(|d| d.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProofStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let data = self
            .data
            .read()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        Ok(data.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        data.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE-BASED STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// File-based storage backend, one `<key>.json` file per entry.
///
/// The directory is created on construction if absent. Concurrent writers
/// for the same key race benignly: entries are idempotent results of the
/// same deterministic input, so the last writer wins.
#[derive(Debug)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a file store rooted at `path`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                Error::Storage(format!("Failed to create cache directory: {}", e))
            })?;
        }

        Ok(Self { base_path })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl ProofStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);

        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| Error::Storage(format!("Failed to read cache entry: {}", e)))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);

        fs::write(&path, value)
            .map_err(|e| Error::Storage(format!("Failed to write cache entry: {}", e)))
    }
}
