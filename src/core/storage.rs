//! Key/Value Storage Abstraction
//!
//! Components that persist anything (leaderboard, weekly play records,
//! lifetime XP) receive a store handle instead of reaching for ambient
//! globals. The in-memory backend ships with the crate; a browser- or
//! file-backed store implements the same trait at the application layer.

use std::collections::BTreeMap;
use std::sync::Mutex;

use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The backend refused the write because it is out of space.
    #[error("storage capacity exceeded")]
    CapacityExceeded,

    /// The backend is not reachable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String-keyed, string-valued persistence.
///
/// Values are JSON blobs produced with `serde_json`; the store itself treats
/// them as opaque.
pub trait KvStore: Send + Sync {
    /// Read a value, `None` if the key is absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value. May fail if the backend is full or unavailable.
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete a key. Deleting an absent key is a no-op.
    fn remove(&self, key: &str);
}

/// In-memory store backed by a `BTreeMap`.
///
/// `max_value_bytes` caps individual values so the leaderboard's
/// storage-full recovery path (retry with fewer entries) can be exercised
/// in tests.
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    max_value_bytes: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            max_value_bytes: None,
        }
    }

    /// Create a store that rejects values larger than `max_value_bytes`.
    pub fn with_value_limit(max_value_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            max_value_bytes: Some(max_value_bytes),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("storage mutex poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        if let Some(limit) = self.max_value_bytes {
            if value.len() > limit {
                return Err(StorageError::CapacityExceeded);
            }
        }
        self.entries
            .lock()
            .expect("storage mutex poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .expect("storage mutex poisoned")
            .remove(key);
    }
}

// =============================================================================
// TESTS
// =============================================================================
