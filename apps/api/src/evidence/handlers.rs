use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::evidence::upload::{ingest_upload, UploadKind};
use crate::models::catalog::{find_preloaded, PreloadedImage, PRELOADED_IMAGES};
use crate::state::AppState;
use crate::storage::blobs::{BlobMetadata, BlobStore};

/// The single `file` part of an upload form.
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Bodies cut off by the request size limit are reported with the same
/// message as a file over the per-upload ceiling.
fn multipart_error(kind: UploadKind, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(kind.too_large_message().to_string())
    } else {
        AppError::Validation(format!("Malformed upload: {e}"))
    }
}

pub async fn read_file_field(kind: UploadKind, mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(kind, e))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(kind, e))?;
        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation("Missing 'file' field".to_string()))
}

fn file_response(content_type: &str, bytes: Bytes) -> (HeaderMap, Bytes) {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    (headers, bytes)
}

pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Fails with `NotFound` unless the id names a preloaded or uploaded image.
pub async fn ensure_subject_image(state: &AppState, image_id: &str) -> Result<(), AppError> {
    if find_preloaded(image_id).is_some() || state.images.get_metadata(image_id).await?.is_some() {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Image {image_id} not found")))
    }
}

async fn upload(
    store: &dyn BlobStore,
    kind: UploadKind,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BlobMetadata>), AppError> {
    let file = read_file_field(kind, multipart).await?;
    let meta = ingest_upload(store, kind, &file.file_name, &file.content_type, file.bytes).await?;
    Ok((StatusCode::CREATED, Json(meta)))
}

// ────────────────────────────────────────────────────────────────────────────
// Subject images
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ImageListResponse {
    pub preloaded: &'static [PreloadedImage],
    pub uploaded: Vec<BlobMetadata>,
}

/// GET /api/v1/images
pub async fn handle_list_images(
    State(state): State<AppState>,
) -> Result<Json<ImageListResponse>, AppError> {
    let uploaded = state.images.list_all().await?;
    Ok(Json(ImageListResponse {
        preloaded: PRELOADED_IMAGES,
        uploaded,
    }))
}

/// POST /api/v1/images
pub async fn handle_upload_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BlobMetadata>), AppError> {
    upload(state.images.as_ref(), UploadKind::SubjectImage, multipart).await
}

/// GET /api/v1/images/:image_id/file
pub async fn handle_get_image_file(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<(HeaderMap, Bytes), AppError> {
    if let Some(preloaded) = find_preloaded(&image_id) {
        let path = state.config.demo_dir.join(preloaded.file_name);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|_| AppError::NotFound(format!("Image {image_id} file is missing")))?;
        return Ok(file_response(content_type_for(preloaded.file_name), Bytes::from(data)));
    }

    let blob = state
        .images
        .get(&image_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Image {image_id} not found")))?;
    Ok(file_response(&blob.metadata.content_type, blob.bytes))
}

/// DELETE /api/v1/images/:image_id
pub async fn handle_delete_image(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if find_preloaded(&image_id).is_some() {
        return Err(AppError::Validation(
            "Preloaded images cannot be deleted".to_string(),
        ));
    }
    state.images.delete(&image_id).await?;
    state.sessions.discard_image(&image_id).await;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Supporting evidence
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/evidence
pub async fn handle_upload_evidence(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BlobMetadata>), AppError> {
    upload(state.evidence.as_ref(), UploadKind::SupportingEvidence, multipart).await
}

/// GET /api/v1/evidence
pub async fn handle_list_evidence(
    State(state): State<AppState>,
) -> Result<Json<Vec<BlobMetadata>>, AppError> {
    Ok(Json(state.evidence.list_all().await?))
}

/// GET /api/v1/evidence/:id
pub async fn handle_get_evidence_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlobMetadata>, AppError> {
    state
        .evidence
        .get_metadata(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Evidence {id} not found")))
}

/// GET /api/v1/evidence/:id/file
pub async fn handle_get_evidence_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(HeaderMap, Bytes), AppError> {
    let blob = state
        .evidence
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Evidence {id} not found")))?;
    Ok(file_response(&blob.metadata.content_type, blob.bytes))
}

/// DELETE /api/v1/evidence/:id
pub async fn handle_delete_evidence(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.evidence.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
