pub mod local;

use std::collections::HashMap;
use std::sync::Mutex;

/// Storage key under which the full board blob lives.
pub const BOARD_KEY: &str = "sparkboard_board_data";

/// Abstract key-value blob store for board persistence.
/// Implementations: MemoryStore (tests, ephemeral sessions),
/// LocalStore (filesystem).
pub trait BlobStore: Send + Sync {
    /// Read the blob stored under `key`, or None if absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous blob.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// In-memory blob store. Contents do not survive the process.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
