//! Handlers proxying the Replicate predictions API.
//!
//! Routes:
//! - `POST /api/replicate`         create a prediction, or poll one
//! - `POST /api/replicate-cancel`  cancel a prediction

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use mashup_core::proxy::{CreateJobResponse, PollResponse};
use mashup_core::types::JobStatus;
use mashup_replicate::{MashupInput, Prediction};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Body of `POST /api/replicate`.
///
/// A `predictionId` turns the call into a status check and every other
/// field is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicateRequest {
    pub prediction_id: Option<String>,
    pub sofa_image_url: Option<String>,
    pub fabric_image_url: Option<String>,
    pub prompt: Option<String>,
    pub model_version: Option<String>,
}

/// Body of `POST /api/replicate-cancel`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub prediction_id: Option<String>,
}

/// POST /api/replicate
pub async fn create_or_poll(
    State(state): State<AppState>,
    Json(input): Json<ReplicateRequest>,
) -> AppResult<Response> {
    match non_blank(input.prediction_id.clone()) {
        Some(id) => poll(&state, id).await,
        None => create(&state, input).await,
    }
}

async fn create(state: &AppState, input: ReplicateRequest) -> AppResult<Response> {
    let (Some(sofa), Some(fabric)) = (
        non_blank(input.sofa_image_url),
        non_blank(input.fabric_image_url),
    ) else {
        return Err(AppError::BadRequest(
            "sofaImageUrl and fabricImageUrl are required".to_string(),
        ));
    };
    let prompt = non_blank(input.prompt)
        .ok_or_else(|| AppError::BadRequest("prompt is required".to_string()))?;

    let payload = MashupInput::new(prompt, sofa, fabric).to_json();
    let prediction = match non_blank(input.model_version) {
        Some(version) => {
            state
                .replicate
                .create_version_prediction(&version, &payload)
                .await?
        }
        None => {
            state
                .replicate
                .create_model_prediction(&state.config.replicate.model, &payload)
                .await?
        }
    };

    tracing::info!(
        prediction_id = ?prediction.id,
        status = %prediction.status,
        "Prediction created",
    );

    Ok(Json(CreateJobResponse {
        status: Some(prediction.status),
        prediction_id: prediction.id,
    })
    .into_response())
}

async fn poll(state: &AppState, prediction_id: String) -> AppResult<Response> {
    let prediction = state.replicate.get_prediction(&prediction_id).await?;
    let (status, body) = poll_body(&prediction, prediction_id);

    tracing::debug!(
        prediction_id = ?body.prediction_id,
        status = %body.status,
        queue_time = ?body.queue_time,
        "Prediction polled",
    );
    Ok((status, Json(body)).into_response())
}

/// Reduce a prediction to the proxy's poll answer.
///
/// A failed prediction is answered with HTTP 500 and `status: "failed"`.
pub fn poll_body(prediction: &Prediction, prediction_id: String) -> (StatusCode, PollResponse) {
    let mut body = PollResponse::new(prediction.status.clone());
    body.prediction_id = Some(prediction_id);
    body.metrics = prediction.metrics.clone();

    match prediction.status {
        JobStatus::Succeeded => {
            body.image_url = prediction.output_url().map(serde_json::Value::String);
            (StatusCode::OK, body)
        }
        JobStatus::Failed => {
            body.message = Some(
                prediction
                    .error_message()
                    .unwrap_or_else(|| "Generation failed".to_string()),
            );
            (StatusCode::INTERNAL_SERVER_ERROR, body)
        }
        _ => {
            body.queue_time = prediction.queue_time_secs(Utc::now());
            (StatusCode::OK, body)
        }
    }
}

/// POST /api/replicate-cancel
///
/// Answers `{ success, data }` or `{ success: false, error }` with the
/// upstream status.
pub async fn cancel(
    State(state): State<AppState>,
    Json(input): Json<CancelRequest>,
) -> Response {
    let Some(prediction_id) = non_blank(input.prediction_id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "predictionId is required" })),
        )
            .into_response();
    };

    match state.replicate.cancel_prediction(&prediction_id).await {
        Ok(data) => {
            tracing::info!(prediction_id, "Prediction cancel forwarded");
            Json(json!({ "success": true, "data": data })).into_response()
        }
        Err(e) => {
            tracing::warn!(prediction_id, error = %e, "Prediction cancel failed");
            let status = e
                .status()
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let error = e
                .detail()
                .unwrap_or_else(|| "Failed to cancel prediction".to_string());
            (status, Json(json!({ "success": false, "error": error }))).into_response()
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
