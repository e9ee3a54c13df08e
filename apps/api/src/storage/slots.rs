use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::storage::{validate_key, StorageError};

/// A small key/value medium holding one serialized document per slot.
#[async_trait]
pub trait SlotStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Slots stored as `<dir>/<key>.json`, each replaced atomically on write.
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl SlotStore for FileSlotStore {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        let dir = self.dir.clone();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || replace_file(&dir, &path, value.as_bytes()))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

/// Writes `data` to a temp file in `dir` and renames it over `path`.
pub(crate) fn replace_file(dir: &Path, path: &Path, data: &[u8]) -> Result<(), StorageError> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_slot_reads_none() {
        let dir = TempDir::new().unwrap();
        let slots = FileSlotStore::new(dir.path());
        assert_eq!(slots.read("nothing_here").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let slots = FileSlotStore::new(dir.path().join("nested"));
        slots.write("k", "[1,2,3]").await.unwrap();
        assert_eq!(slots.read("k").await.unwrap().as_deref(), Some("[1,2,3]"));
        slots.write("k", "[]").await.unwrap();
        assert_eq!(slots.read("k").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_invalid_key_rejected() {
        let dir = TempDir::new().unwrap();
        let slots = FileSlotStore::new(dir.path());
        assert!(matches!(
            slots.write("../escape", "x").await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
