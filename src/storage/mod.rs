//! Persistence collaborators. The store writes whole-document snapshots under fixed keys.

pub mod backup;
pub mod json_backend;
pub mod memory;

use thiserror::Error;

pub use backup::{Backup, BACKUP_FORMAT_VERSION};
pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;

pub const TRANSACTIONS_KEY: &str = "transactions";
pub const CATEGORIES_KEY: &str = "categories";
pub const BUDGETS_KEY: &str = "budgets";
pub const SETTINGS_KEY: &str = "settings";
pub const BACKUPS_KEY: &str = "backups";

/// Failures reported by a key-value backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would exceed the backend's capacity. Callers may reclaim space and retry.
    #[error("storage quota exceeded writing `{key}` ({required} bytes needed, {available} available)")]
    QuotaExceeded {
        key: String,
        required: usize,
        available: usize,
    },
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Abstraction over string key-value persistence (browser-style local storage).
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}
