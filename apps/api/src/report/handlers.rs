use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    Json,
};
use chrono::Utc;
use image::DynamicImage;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::evidence::resolve::resolve_for_annotations;
use crate::models::catalog::find_preloaded;
use crate::report::compose::{export_report, ReportInput, SubjectImageError};
use crate::state::AppState;

const UPLOADED_IMAGE_TITLE: &str = "Uploaded Image";

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    /// Canvas size the annotations were placed on.
    pub rendered_width: f64,
    pub rendered_height: f64,
}

/// Raw subject bytes plus the title printed on the report.
struct Subject {
    title: String,
    bytes: Option<Bytes>,
}

async fn load_subject(state: &AppState, image_id: &str) -> Result<Subject, AppError> {
    if let Some(preloaded) = find_preloaded(image_id) {
        let path = state.config.demo_dir.join(preloaded.file_name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(data) => Some(Bytes::from(data)),
            Err(e) => {
                warn!(image_id, path = %path.display(), "Demo image unreadable: {e}");
                None
            }
        };
        return Ok(Subject {
            title: preloaded.report_title(),
            bytes,
        });
    }

    let meta = state
        .images
        .get_metadata(image_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Image {image_id} not found")))?;
    let bytes = state.images.get(image_id).await?.map(|blob| blob.bytes);
    let title = if meta.name.trim().is_empty() {
        UPLOADED_IMAGE_TITLE.to_string()
    } else {
        meta.name
    };
    Ok(Subject { title, bytes })
}

async fn decode_subject(bytes: Option<Bytes>) -> Result<DynamicImage, SubjectImageError> {
    let bytes = bytes.ok_or(SubjectImageError::Missing)?;
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes).map_err(|e| SubjectImageError::Decode(e.to_string()))
    })
    .await
    .map_err(|e| SubjectImageError::Decode(e.to_string()))?
}

/// POST /api/v1/images/:image_id/report
/// Renders the committed annotations of an image into a PDF download. A copy
/// is also written to the export directory when it is writable.
pub async fn handle_export_report(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
    Json(req): Json<ReportRequest>,
) -> Result<(HeaderMap, Bytes), AppError> {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !usable(req.rendered_width) || !usable(req.rendered_height) {
        return Err(AppError::Validation(
            "rendered_width and rendered_height must be positive".to_string(),
        ));
    }

    let subject = load_subject(&state, &image_id).await?;
    let image = decode_subject(subject.bytes).await;
    let annotations = state.annotations.list(&image_id).await;
    let evidence = resolve_for_annotations(state.evidence.as_ref(), &annotations).await;
    let settings = state.settings.get().await;

    let report = export_report(ReportInput {
        image_title: subject.title,
        image,
        annotations,
        evidence,
        rendered_width: req.rendered_width,
        rendered_height: req.rendered_height,
        investigator: settings.investigator_name().to_string(),
        generated_at: Utc::now(),
    })
    .await?;

    let export_path = state.config.export_dir.join(&report.filename);
    match tokio::fs::create_dir_all(&state.config.export_dir).await {
        Ok(()) => {
            if let Err(e) = tokio::fs::write(&export_path, &report.bytes).await {
                warn!(path = %export_path.display(), "Could not keep report copy: {e}");
            }
        }
        Err(e) => warn!(dir = %state.config.export_dir.display(), "Export dir unavailable: {e}"),
    }

    info!(
        image_id = %image_id,
        report_id = %report.report_id,
        pages = report.page_count,
        finding_pages = ?report.finding_pages,
        "Report exported"
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    let disposition = format!("attachment; filename=\"{}\"", report.filename.replace('"', ""));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&report.report_id) {
        headers.insert(HeaderName::from_static("x-report-id"), value);
    }
    Ok((headers, Bytes::from(report.bytes)))
}
