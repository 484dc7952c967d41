//! `ProxyClient` against an in-process axum stand-in for the proxy.

use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use mashup_core::proxy::CreateJobRequest;
use mashup_core::types::{ImageRef, JobStatus};
use mashup_pipeline::{BackendError, GenerationBackend, ProxyClient};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    cancels: Arc<Mutex<Vec<Value>>>,
}

async fn replicate(State(rec): State<Recorded>, Json(body): Json<Value>) -> impl IntoResponse {
    rec.bodies.lock().unwrap().push(body.clone());

    if let Some(id) = body.get("predictionId").and_then(Value::as_str) {
        return match id {
            "done" => (
                StatusCode::OK,
                Json(json!({
                    "status": "succeeded",
                    "imageUrl": ["https://replicate.delivery/a.jpg"],
                    "predictionId": "done",
                })),
            )
                .into_response(),
            "broken" => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "failed", "message": "CUDA out of memory" })),
            )
                .into_response(),
            _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "Prediction not found" })))
                .into_response(),
        };
    }

    if body["prompt"].as_str() == Some("too big") {
        return (StatusCode::PAYLOAD_TOO_LARGE, "Request Entity Too Large").into_response();
    }
    (
        StatusCode::OK,
        Json(json!({ "status": "starting", "predictionId": "p-123" })),
    )
        .into_response()
}

async fn cancel(State(rec): State<Recorded>, Json(body): Json<Value>) -> impl IntoResponse {
    rec.cancels.lock().unwrap().push(body);
    Json(json!({ "status": "canceled" }))
}

async fn spawn_proxy() -> (String, Recorded) {
    let rec = Recorded::default();
    let app = Router::new()
        .route("/api/replicate", post(replicate))
        .route("/api/replicate-cancel", post(cancel))
        .with_state(rec.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/"), rec)
}

fn request(prompt: &str) -> CreateJobRequest {
    CreateJobRequest {
        sofa_image_url: ImageRef::Url("https://x/sofa.jpg".into()),
        fabric_image_url: ImageRef::inline("image/jpeg", "AAAA"),
        prompt: prompt.to_string(),
        model_version: None,
    }
}

#[tokio::test]
async fn create_sends_camel_case_body() {
    let (base, rec) = spawn_proxy().await;
    let client = ProxyClient::new(base);

    let response = client.create(&request("make it blue")).await.unwrap();
    assert_eq!(response.prediction_id.as_deref(), Some("p-123"));
    assert_eq!(response.status, Some(JobStatus::Starting));

    let body = rec.bodies.lock().unwrap()[0].clone();
    assert_eq!(body["sofaImageUrl"], "https://x/sofa.jpg");
    assert_eq!(body["fabricImageUrl"], "data:image/jpeg;base64,AAAA");
    assert!(body.get("modelVersion").is_none());
}

#[tokio::test]
async fn plain_text_413_is_payload_too_large() {
    let (base, _) = spawn_proxy().await;
    let client = ProxyClient::new(base);

    let err = client.create(&request("too big")).await.unwrap_err();
    assert!(err.is_payload_too_large());
    assert_matches!(err, BackendError::Status { status: 413, message: None });
}

#[tokio::test]
async fn poll_returns_result_url() {
    let (base, rec) = spawn_proxy().await;
    let client = ProxyClient::new(base);

    let response = client.poll("done").await.unwrap();
    assert_eq!(response.status, JobStatus::Succeeded);
    assert_eq!(
        response.result_url().as_deref(),
        Some("https://replicate.delivery/a.jpg")
    );
    assert_eq!(rec.bodies.lock().unwrap()[0], json!({ "predictionId": "done" }));
}

#[tokio::test]
async fn failed_status_in_error_body_is_not_an_error() {
    let (base, _) = spawn_proxy().await;
    let client = ProxyClient::new(base);

    let response = client.poll("broken").await.unwrap();
    assert_eq!(response.status, JobStatus::Failed);
    assert_eq!(response.message.as_deref(), Some("CUDA out of memory"));
}

#[tokio::test]
async fn unknown_prediction_surfaces_message() {
    let (base, _) = spawn_proxy().await;
    let client = ProxyClient::new(base);

    let err = client.poll("nope").await.unwrap_err();
    assert_matches!(
        err,
        BackendError::Status { status: 404, message: Some(ref m) } if m == "Prediction not found"
    );
}

#[tokio::test]
async fn cancel_posts_prediction_id() {
    let (base, rec) = spawn_proxy().await;
    let client = ProxyClient::new(base);

    client.cancel("p-123").await.unwrap();
    assert_eq!(
        rec.cancels.lock().unwrap()[0],
        json!({ "predictionId": "p-123" })
    );
}

#[tokio::test]
async fn unreachable_proxy_is_transport_error() {
    let client = ProxyClient::new("http://127.0.0.1:9".to_string());
    let err = client.create(&request("x")).await.unwrap_err();
    assert_matches!(err, BackendError::Transport(_));
}
