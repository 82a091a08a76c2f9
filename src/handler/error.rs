use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::services::PlateError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    UnprocessableEntity(String),
    InternalServerError,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "not found", "message": msg})),
            )
                .into_response(),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "bad request", "message": msg})),
            )
                .into_response(),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                Json(json!({"error": "conflict", "message": msg})),
            )
                .into_response(),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"error": "insufficient volume", "message": msg})),
            )
                .into_response(),
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal server error"})),
            )
                .into_response(),
        }
    }
}

impl From<PlateError> for AppError {
    fn from(err: PlateError) -> Self {
        match err {
            PlateError::NotFound { .. } => AppError::NotFound(err.to_string()),
            PlateError::InvalidStrategy(_)
            | PlateError::InvalidReplicateCount(_)
            | PlateError::InvalidIdentifier(_)
            | PlateError::InvalidRequest(_) => AppError::BadRequest(err.to_string()),
            PlateError::InsufficientVolume { .. } => AppError::UnprocessableEntity(err.to_string()),
            PlateError::Conflict { .. } => AppError::Conflict(err.to_string()),
            PlateError::Store(source) => {
                tracing::error!("store failure: {}", source);
                AppError::InternalServerError
            }
        }
    }
}

/// Runs blocking store work off the async runtime.
pub async fn blocking<T, F>(work: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, PlateError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| {
            tracing::error!("blocking task failed: {}", e);
            AppError::InternalServerError
        })?
        .map_err(AppError::from)
}
