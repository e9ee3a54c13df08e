use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::asset::AssetDescriptor;
use crate::state::AppState;

#[derive(Serialize)]
pub struct AssetListResponse {
    pub assets: Vec<AssetDescriptor>,
}

/// GET /api/v1/proofsnap/assets
///
/// Lists the investigator's ProofSnap assets using the capture token from settings.
/// Assets without a usable id or file are dropped.
pub async fn handle_list_assets(
    State(state): State<AppState>,
) -> Result<Json<AssetListResponse>, AppError> {
    let settings = state.settings.get().await;
    let token = settings.capture_token.ok_or_else(|| {
        AppError::Validation("Please add your Capture Token in Settings first".to_string())
    })?;

    let assets = state
        .assets
        .fetch_assets(&token)
        .await?
        .iter()
        .filter_map(|asset| asset.descriptor())
        .collect();

    Ok(Json(AssetListResponse { assets }))
}
