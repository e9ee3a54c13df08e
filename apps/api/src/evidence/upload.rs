use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::catalog::UPLOAD_ID_PREFIX;
use crate::storage::blobs::{BlobMetadata, BlobStore, NewBlob, Partition};
use crate::storage::StorageError;

/// 10 MB, the largest image accepted for either partition.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    SubjectImage,
    SupportingEvidence,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("{0}")]
    NotAnImage(&'static str),

    #[error("{0}")]
    TooLarge(&'static str),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Rejected(#[from] UploadRejection),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadKind {
    pub fn partition(self) -> Partition {
        match self {
            UploadKind::SubjectImage => Partition::Images,
            UploadKind::SupportingEvidence => Partition::Evidence,
        }
    }

    fn not_an_image_message(self) -> &'static str {
        match self {
            UploadKind::SubjectImage => "Please upload an image file (PNG, JPG, WEBP)",
            UploadKind::SupportingEvidence => "Please upload an image file",
        }
    }

    pub fn too_large_message(self) -> &'static str {
        match self {
            UploadKind::SubjectImage => "Image must be smaller than 10MB",
            UploadKind::SupportingEvidence => "Evidence image must be smaller than 10MB",
        }
    }

    /// `upload-<millis>` for subject images, `evidence-<millis>-<uuid>` for evidence.
    pub fn generate_id(self) -> String {
        let millis = Utc::now().timestamp_millis();
        match self {
            UploadKind::SubjectImage => format!("{UPLOAD_ID_PREFIX}{millis}"),
            UploadKind::SupportingEvidence => format!("evidence-{millis}-{}", Uuid::new_v4()),
        }
    }
}

/// Checks the declared MIME type and size. Runs before anything touches a store.
pub fn validate_upload(
    kind: UploadKind,
    content_type: &str,
    size: usize,
) -> Result<(), UploadRejection> {
    if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(UploadRejection::NotAnImage(kind.not_an_image_message()));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge(kind.too_large_message()));
    }
    Ok(())
}

/// Validates and stores one uploaded file, returning the stored metadata.
pub async fn ingest_upload(
    store: &dyn BlobStore,
    kind: UploadKind,
    file_name: &str,
    content_type: &str,
    bytes: Bytes,
) -> Result<BlobMetadata, UploadError> {
    validate_upload(kind, content_type, bytes.len())?;

    let id = kind.generate_id();
    let size = bytes.len();
    let id = store
        .save(
            &id,
            NewBlob {
                name: file_name.to_string(),
                content_type: content_type.to_string(),
                bytes,
            },
        )
        .await?;

    info!(id = %id, size, partition = kind.partition().dir_name(), "Stored upload");

    store
        .get_metadata(&id)
        .await?
        .ok_or_else(|| UploadError::Storage(StorageError::Task(format!("upload {id} vanished"))))
}
