use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::settings::AppSettings;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SettingsResponse {
    #[serde(flatten)]
    pub settings: AppSettings,
    /// Name printed on reports, with the default applied.
    pub investigator_name: String,
}

impl From<AppSettings> for SettingsResponse {
    fn from(settings: AppSettings) -> Self {
        Self {
            investigator_name: settings.investigator_name().to_string(),
            settings,
        }
    }
}

/// GET /api/v1/settings
pub async fn handle_get_settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(state.settings.get().await.into())
}

/// PUT /api/v1/settings
pub async fn handle_put_settings(
    State(state): State<AppState>,
    Json(req): Json<AppSettings>,
) -> Result<Json<SettingsResponse>, AppError> {
    let saved = state.settings.set(req).await?;
    Ok(Json(saved.into()))
}
