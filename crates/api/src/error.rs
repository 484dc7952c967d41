use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mashup_cloudinary::CloudinaryError;
use mashup_core::error::CoreError;
use mashup_replicate::ReplicateApiError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Produces `{ "message", "error", "code" }` JSON bodies. Both text fields
/// carry the same message because existing clients read either one.
/// Replicate rejections keep their upstream status so a 413 from the
/// provider reaches the pipeline as a 413.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Replicate(#[from] ReplicateApiError),

    #[error(transparent)]
    Cloudinary(#[from] CloudinaryError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                other => {
                    tracing::error!(error = %other, "Internal core error");
                    internal()
                }
            },

            AppError::Replicate(err) => match err {
                ReplicateApiError::ApiError { status, .. } => {
                    let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                    tracing::warn!(%status, error = %err, "Replicate rejected request");
                    (
                        status,
                        "UPSTREAM_ERROR",
                        err.detail().unwrap_or_else(|| "Replicate error".to_string()),
                    )
                }
                ReplicateApiError::Request(e) => {
                    tracing::error!(error = %e, "Replicate unreachable");
                    (
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_UNAVAILABLE",
                        "Could not reach the generation service".to_string(),
                    )
                }
            },

            AppError::Cloudinary(err) => match err {
                CloudinaryError::NotConfigured(what) => {
                    tracing::error!(what, "Cloudinary not configured");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "CONFIGURATION_ERROR",
                        "Server configuration error: Missing API credentials".to_string(),
                    )
                }
                other => {
                    tracing::error!(error = %other, "Cloudinary call failed");
                    (
                        StatusCode::BAD_GATEWAY,
                        "UPSTREAM_UNAVAILABLE",
                        "Could not reach the storage service".to_string(),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "message": message,
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
