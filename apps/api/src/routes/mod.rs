pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::annotations::handlers as annotations;
use crate::asset_client::handlers as assets;
use crate::evidence::handlers as evidence;
use crate::report::handlers as report;
use crate::settings;
use crate::state::AppState;

/// Large enough that oversized uploads reach validation and get a 413 with
/// the domain message instead of being cut off by the extractor.
pub const BODY_LIMIT_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Subject images
        .route(
            "/api/v1/images",
            get(evidence::handle_list_images).post(evidence::handle_upload_image),
        )
        .route(
            "/api/v1/images/:image_id",
            delete(evidence::handle_delete_image),
        )
        .route(
            "/api/v1/images/:image_id/file",
            get(evidence::handle_get_image_file),
        )
        // Annotations
        .route(
            "/api/v1/images/:image_id/annotations",
            get(annotations::handle_list_annotations).post(annotations::handle_place_annotation),
        )
        .route(
            "/api/v1/annotations/:id",
            put(annotations::handle_commit_annotation).delete(annotations::handle_delete_annotation),
        )
        .route(
            "/api/v1/annotations/:id/close",
            post(annotations::handle_close_annotation),
        )
        // Supporting evidence
        .route(
            "/api/v1/evidence",
            get(evidence::handle_list_evidence).post(evidence::handle_upload_evidence),
        )
        .route(
            "/api/v1/evidence/:id",
            get(evidence::handle_get_evidence_metadata).delete(evidence::handle_delete_evidence),
        )
        .route(
            "/api/v1/evidence/:id/file",
            get(evidence::handle_get_evidence_file),
        )
        // Settings and ProofSnap
        .route(
            "/api/v1/settings",
            get(settings::handle_get_settings).put(settings::handle_put_settings),
        )
        .route("/api/v1/proofsnap/assets", get(assets::handle_list_assets))
        // Reports
        .route(
            "/api/v1/images/:image_id/report",
            post(report::handle_export_report),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}
