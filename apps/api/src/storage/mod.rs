//! Local persistence: key/value slots for records and settings, and a
//! partitioned blob store for uploaded images and supporting evidence.
//!
//! Everything lives under the configured data directory. Stores are built
//! explicitly and handed to consumers through `AppState`; nothing here is a
//! process-wide singleton.

pub mod annotations;
pub mod blobs;
pub mod settings;
pub mod slots;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Store is closed")]
    Closed,

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Keys become file names, so only a conservative character set is accepted.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key.len() <= 128
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
