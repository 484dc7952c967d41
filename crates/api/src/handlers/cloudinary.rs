//! Handler for deleting stored images on Cloudinary.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use mashup_cloudinary::CloudinaryError;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub public_id: Option<String>,
}

/// POST /api/cloudinary-delete
///
/// Signs and forwards a destroy call. Cloudinary reports a missing asset
/// in a 200 body, which is answered here with 400 and the raw verdict.
pub async fn delete_image(
    State(state): State<AppState>,
    Json(input): Json<DeleteRequest>,
) -> AppResult<Response> {
    let public_id = input
        .public_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("public_id is required".to_string()))?;

    let client = state
        .cloudinary
        .as_ref()
        .ok_or(CloudinaryError::NotConfigured("missing API credentials"))?;

    let verdict = client.destroy(&public_id, Utc::now().timestamp()).await?;

    if verdict.get("result").and_then(|r| r.as_str()) == Some("ok") {
        tracing::info!(public_id, "Image deleted");
        return Ok(Json(json!({
            "success": true,
            "message": "Image deleted successfully",
            "public_id": public_id,
        }))
        .into_response());
    }

    tracing::warn!(public_id, verdict = %verdict, "Cloudinary deletion failed");
    Ok((
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "error": "Deletion failed",
            "details": verdict,
        })),
    )
        .into_response())
}
