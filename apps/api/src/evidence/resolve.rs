use chrono::{DateTime, Utc};
use futures::future::join_all;
use image::DynamicImage;
use thiserror::Error;
use tracing::warn;

use crate::models::annotation::Annotation;
use crate::storage::blobs::BlobStore;
use crate::storage::StorageError;

/// Longest edge, in pixels, of a decoded evidence thumbnail.
pub const THUMBNAIL_MAX_PX: u32 = 400;

/// A supporting-evidence blob decoded and ready to place in a report.
#[derive(Debug, Clone)]
pub struct ResolvedEvidence {
    pub id: String,
    pub name: String,
    pub uploaded_at: DateTime<Utc>,
    pub image: DynamicImage,
}

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("evidence {0} not found")]
    Missing(String),

    #[error("evidence {id} could not be decoded: {source}")]
    Decode {
        id: String,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("decode task failed: {0}")]
    Task(String),
}

/// Loads and decodes one evidence blob.
pub async fn resolve_one(store: &dyn BlobStore, id: &str) -> Result<ResolvedEvidence, EvidenceError> {
    let blob = store
        .get(id)
        .await?
        .ok_or_else(|| EvidenceError::Missing(id.to_string()))?;

    let owned_id = id.to_string();
    let bytes = blob.bytes;
    let image = tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes)
            .map(|img| img.thumbnail(THUMBNAIL_MAX_PX, THUMBNAIL_MAX_PX))
            .map_err(|source| EvidenceError::Decode { id: owned_id, source })
    })
    .await
    .map_err(|e| EvidenceError::Task(e.to_string()))??;

    Ok(ResolvedEvidence {
        id: blob.metadata.id,
        name: blob.metadata.name,
        uploaded_at: blob.metadata.uploaded_at,
        image,
    })
}

/// Resolves every evidence id of every annotation concurrently.
///
/// The outer vector is indexed like `annotations`, the inner one keeps each
/// annotation's id order. Items that fail to resolve are logged and left out.
pub async fn resolve_for_annotations(
    store: &dyn BlobStore,
    annotations: &[Annotation],
) -> Vec<Vec<ResolvedEvidence>> {
    let per_annotation = annotations.iter().map(|annotation| async move {
        let results = join_all(
            annotation
                .supporting_evidence_ids
                .iter()
                .map(|id| resolve_one(store, id)),
        )
        .await;

        results
            .into_iter()
            .filter_map(|result| match result {
                Ok(evidence) => Some(evidence),
                Err(e) => {
                    warn!(annotation = %annotation.id, "Skipping supporting evidence: {e}");
                    None
                }
            })
            .collect::<Vec<_>>()
    });

    join_all(per_annotation).await
}
