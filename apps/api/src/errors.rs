use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::debit::batch::BatchFailure;
use crate::render::RenderError;
use crate::upload::UploadError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No document could be generated ({} rows failed)", .0.len())]
    NothingGenerated(Vec<BatchFailure>),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details: Option<Value> = None;
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NothingGenerated(failures) => {
                details = serde_json::to_value(failures).ok();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "NOTHING_GENERATED",
                    "No document could be generated".to_string(),
                )
            }
            AppError::Upload(e) => {
                tracing::warn!("Rejected upload: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INVALID_SPREADSHEET",
                    format!(
                        "{e}. Check that the column names match the model spreadsheet \
                         and that the data format is valid."
                    ),
                )
            }
            AppError::Render(e) => {
                tracing::error!("Render error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    format!("Could not generate the document: {e}"),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["failed"] = details;
        }
        let body = Json(json!({ "error": error }));

        (status, body).into_response()
    }
}
