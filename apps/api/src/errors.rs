use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::asset_client::AssetDirectoryError;
use crate::evidence::upload::{UploadError, UploadRejection};
use crate::report::compose::ReportError;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Failed to load ProofSnap assets. Check your token.")]
    RemoteUnauthorized,

    #[error("ProofSnap unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Rejected(UploadRejection::NotAnImage(msg)) => {
                AppError::UnsupportedMediaType(msg.to_string())
            }
            UploadError::Rejected(UploadRejection::TooLarge(msg)) => {
                AppError::PayloadTooLarge(msg.to_string())
            }
            UploadError::Storage(e) => AppError::Storage(e),
        }
    }
}

impl From<AssetDirectoryError> for AppError {
    fn from(e: AssetDirectoryError) -> Self {
        match e {
            AssetDirectoryError::Unauthorized => AppError::RemoteUnauthorized,
            AssetDirectoryError::Unavailable(msg) => AppError::RemoteUnavailable(msg),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(e: ReportError) -> Self {
        AppError::Report(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, retryable) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), false),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), false)
            }
            AppError::UnsupportedMediaType(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                msg.clone(),
                false,
            ),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
                false,
            ),
            AppError::RemoteUnauthorized => (
                StatusCode::UNAUTHORIZED,
                "REMOTE_UNAUTHORIZED",
                self.to_string(),
                true,
            ),
            AppError::RemoteUnavailable(msg) => {
                tracing::error!("ProofSnap error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "REMOTE_UNAVAILABLE",
                    "Failed to load ProofSnap assets. Please try again.".to_string(),
                    true,
                )
            }
            AppError::Storage(StorageError::InvalidKey(key)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("Invalid id '{key}'"),
                false,
            ),
            AppError::Storage(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                    true,
                )
            }
            AppError::Report(msg) => {
                tracing::error!("Report error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPORT_ERROR",
                    "The report could not be generated".to_string(),
                    true,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    false,
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "retryable": retryable
            }
        }));

        (status, body).into_response()
    }
}
