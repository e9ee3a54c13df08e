//! Blob storage for subject images and supporting evidence.
//!
//! Each blob is two files in its partition directory: `<id>.bin` with the raw
//! bytes and `<id>.json` with metadata. The metadata file is written last, so a
//! blob without metadata was never committed and is invisible to readers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::storage::slots::replace_file;
use crate::storage::{validate_key, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Images,
    Evidence,
}

impl Partition {
    pub fn dir_name(self) -> &'static str {
        match self {
            Partition::Images => "images",
            Partition::Evidence => "evidence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub id: String,
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub metadata: BlobMetadata,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct NewBlob {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn save(&self, id: &str, blob: NewBlob) -> Result<String, StorageError>;
    async fn get(&self, id: &str) -> Result<Option<StoredBlob>, StorageError>;
    async fn get_metadata(&self, id: &str) -> Result<Option<BlobMetadata>, StorageError>;
    async fn delete(&self, id: &str) -> Result<(), StorageError>;
    /// All committed blobs, oldest first.
    async fn list_all(&self) -> Result<Vec<BlobMetadata>, StorageError>;
}

pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    /// Store rooted at `<root>/blobs/<partition>`.
    pub fn new(root: impl AsRef<Path>, partition: Partition) -> Self {
        Self {
            dir: root.as_ref().join("blobs").join(partition.dir_name()),
        }
    }

    fn paths(&self, id: &str) -> Result<(PathBuf, PathBuf), StorageError> {
        validate_key(id)?;
        Ok((
            self.dir.join(format!("{id}.bin")),
            self.dir.join(format!("{id}.json")),
        ))
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn remove_optional(path: &Path) -> Result<(), StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn save(&self, id: &str, blob: NewBlob) -> Result<String, StorageError> {
        let (bin_path, meta_path) = self.paths(id)?;
        let metadata = BlobMetadata {
            id: id.to_string(),
            name: blob.name,
            content_type: blob.content_type,
            size: blob.bytes.len() as u64,
            uploaded_at: Utc::now(),
        };
        let meta_json = serde_json::to_vec(&metadata)?;
        let dir = self.dir.clone();
        let bytes = blob.bytes;

        tokio::task::spawn_blocking(move || {
            replace_file(&dir, &bin_path, &bytes)?;
            replace_file(&dir, &meta_path, &meta_json)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))??;

        Ok(metadata.id)
    }

    async fn get(&self, id: &str) -> Result<Option<StoredBlob>, StorageError> {
        let Some(metadata) = self.get_metadata(id).await? else {
            return Ok(None);
        };
        let (bin_path, _) = self.paths(id)?;
        Ok(read_optional(&bin_path).await?.map(|data| StoredBlob {
            metadata,
            bytes: Bytes::from(data),
        }))
    }

    async fn get_metadata(&self, id: &str) -> Result<Option<BlobMetadata>, StorageError> {
        let (_, meta_path) = self.paths(id)?;
        match read_optional(&meta_path).await? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        let (bin_path, meta_path) = self.paths(id)?;
        // Metadata first so a half-deleted blob is already invisible.
        remove_optional(&meta_path).await?;
        remove_optional(&bin_path).await
    }

    async fn list_all(&self) -> Result<Vec<BlobMetadata>, StorageError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut all = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let data = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<BlobMetadata>(&data) {
                Ok(meta) => all.push(meta),
                Err(e) => warn!(path = %path.display(), "Skipping corrupt blob metadata: {e}"),
            }
        }

        all.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}
