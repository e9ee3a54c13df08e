use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::annotations::session::{CloseOutcome, PersistState, WorkingAnnotation};
use crate::errors::AppError;
use crate::evidence::handlers::ensure_subject_image;
use crate::evidence::tier::{classify, EvidenceTier};
use crate::models::annotation::{Annotation, AnnotationEdits};
use crate::state::AppState;

/// An annotation as the editor sees it: its display number, derived tier and
/// whether it has been saved yet.
#[derive(Debug, Serialize)]
pub struct AnnotationView {
    #[serde(flatten)]
    pub annotation: Annotation,
    pub number: usize,
    pub tier: Option<u8>,
    pub tier_label: Option<&'static str>,
    pub state: PersistState,
}

impl AnnotationView {
    fn new(number: usize, entry: WorkingAnnotation) -> Self {
        let tier = classify(&entry.annotation);
        Self {
            number,
            tier: tier.map(EvidenceTier::rank),
            tier_label: tier.map(EvidenceTier::label),
            state: entry.state,
            annotation: entry.annotation,
        }
    }
}

async fn view_of(state: &AppState, annotation: &Annotation) -> Option<AnnotationView> {
    state
        .sessions
        .working_copy(&state.annotations, &annotation.image_id)
        .await
        .into_iter()
        .enumerate()
        .find(|(_, entry)| entry.annotation.id == annotation.id)
        .map(|(i, entry)| AnnotationView::new(i + 1, entry))
}

/// GET /api/v1/images/:image_id/annotations
pub async fn handle_list_annotations(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
) -> Json<Vec<AnnotationView>> {
    let views = state
        .sessions
        .working_copy(&state.annotations, &image_id)
        .await
        .into_iter()
        .enumerate()
        .map(|(i, entry)| AnnotationView::new(i + 1, entry))
        .collect();
    Json(views)
}

#[derive(Deserialize)]
pub struct PlaceRequest {
    pub x: f64,
    pub y: f64,
}

/// POST /api/v1/images/:image_id/annotations
pub async fn handle_place_annotation(
    State(state): State<AppState>,
    Path(image_id): Path<String>,
    Json(req): Json<PlaceRequest>,
) -> Result<(StatusCode, Json<AnnotationView>), AppError> {
    if !req.x.is_finite() || !req.y.is_finite() {
        return Err(AppError::Validation(
            "x and y must be finite numbers".to_string(),
        ));
    }
    ensure_subject_image(&state, &image_id).await?;

    let draft = state.sessions.place_draft(&image_id, req.x, req.y).await;
    let view = view_of(&state, &draft)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Annotation {} not found", draft.id)))?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PUT /api/v1/annotations/:id
pub async fn handle_commit_annotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(edits): Json<AnnotationEdits>,
) -> Result<Json<AnnotationView>, AppError> {
    let committed = state
        .sessions
        .commit(&state.annotations, &id, edits)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Annotation {id} not found")))?;

    let view = view_of(&state, &committed).await.unwrap_or_else(|| {
        AnnotationView::new(
            0,
            WorkingAnnotation {
                annotation: committed,
                state: PersistState::Committed,
            },
        )
    });
    Ok(Json(view))
}

#[derive(Serialize)]
pub struct CloseResponse {
    pub outcome: CloseOutcome,
}

/// POST /api/v1/annotations/:id/close
pub async fn handle_close_annotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CloseResponse>, AppError> {
    let outcome = state
        .sessions
        .close(&state.annotations, &id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Annotation {id} not found")))?;
    Ok(Json(CloseResponse { outcome }))
}

/// DELETE /api/v1/annotations/:id
pub async fn handle_delete_annotation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(&state.annotations, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
