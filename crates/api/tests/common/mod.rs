//! Shared helpers for API integration tests.
//!
//! The upstream services are replaced by small axum apps bound to
//! ephemeral ports, so the real `ReplicateApi` and `CloudinaryClient`
//! HTTP code runs end to end.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{self, post};
use axum::{Form, Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use mashup_api::config::{CloudinaryConfig, ReplicateConfig, ServerConfig};
use mashup_api::router::build_app_router;
use mashup_api::state::AppState;
use mashup_cloudinary::CloudinaryClient;
use mashup_replicate::ReplicateApi;

pub const TEST_TOKEN: &str = "r8_test_token";
pub const TEST_MODEL: &str = "google/nano-banana-pro";
pub const RESULT_URL: &str = "https://replicate.delivery/xezq/out-0.jpg";

// ---------------------------------------------------------------------------
// Upstream mocks
// ---------------------------------------------------------------------------

/// Everything the mock upstreams received.
#[derive(Clone, Default)]
pub struct Upstream {
    pub creates: Arc<Mutex<Vec<(String, Value)>>>,
    pub auth_headers: Arc<Mutex<Vec<String>>>,
    pub cancels: Arc<Mutex<Vec<String>>>,
    pub destroys: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

fn record_auth(up: &Upstream, headers: &HeaderMap) {
    let value = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    up.auth_headers.lock().unwrap().push(value);
}

async fn create_model_prediction(
    State(up): State<Upstream>,
    Path((owner, name)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&up, &headers);
    up.creates
        .lock()
        .unwrap()
        .push((format!("models/{owner}/{name}"), body.clone()));

    match body["input"]["prompt"].as_str() {
        Some("reject") => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "Invalid image input" })),
        )
            .into_response(),
        Some("huge") => (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({ "error": "Request Entity Too Large" })),
        )
            .into_response(),
        Some("opaque") => (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").into_response(),
        _ => (
            StatusCode::CREATED,
            Json(json!({
                "id": "p-new",
                "status": "starting",
                "created_at": chrono::Utc::now().to_rfc3339(),
            })),
        )
            .into_response(),
    }
}

async fn create_version_prediction(
    State(up): State<Upstream>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&up, &headers);
    up.creates
        .lock()
        .unwrap()
        .push(("predictions".to_string(), body));
    (
        StatusCode::CREATED,
        Json(json!({ "id": "p-ver", "status": "starting" })),
    )
        .into_response()
}

async fn get_prediction(
    State(up): State<Upstream>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    record_auth(&up, &headers);
    let created = chrono::Utc::now() - chrono::Duration::seconds(90);
    let body = match id.as_str() {
        "done" => json!({
            "id": id,
            "status": "succeeded",
            "output": [RESULT_URL],
            "metrics": { "predict_time": 12.3 },
            "created_at": created.to_rfc3339(),
            "started_at": created.to_rfc3339(),
        }),
        "bad" => json!({ "id": id, "status": "failed", "error": "E001: model crashed" }),
        "queued" => json!({ "id": id, "status": "starting", "created_at": created.to_rfc3339() }),
        "running" => json!({
            "id": id,
            "status": "processing",
            "created_at": created.to_rfc3339(),
            "started_at": chrono::Utc::now().to_rfc3339(),
        }),
        _ => {
            return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
        }
    };
    Json(body).into_response()
}

async fn cancel_prediction(State(up): State<Upstream>, Path(id): Path<String>) -> Response {
    up.cancels.lock().unwrap().push(id.clone());
    if id == "gone" {
        return (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response();
    }
    Json(json!({ "id": id, "status": "canceled" })).into_response()
}

async fn destroy(
    State(up): State<Upstream>,
    Path(_cloud): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    let missing = form.get("public_id").map(String::as_str) == Some("missing");
    up.destroys.lock().unwrap().push(form);
    if missing {
        Json(json!({ "result": "not found" }))
    } else {
        Json(json!({ "result": "ok" }))
    }
}

/// Start the upstream mocks and return their base URL.
pub async fn spawn_upstream() -> (String, Upstream) {
    let up = Upstream::default();
    let app = Router::new()
        .route("/models/{owner}/{name}/predictions", post(create_model_prediction))
        .route("/predictions", post(create_version_prediction))
        .route("/predictions/{id}", routing::get(get_prediction))
        .route("/predictions/{id}/cancel", post(cancel_prediction))
        .route("/cloudinary/{cloud}/image/destroy", post(destroy))
        .with_state(up.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), up)
}

// ---------------------------------------------------------------------------
// App under test
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` pointing at `upstream_base`.
pub fn test_config(upstream_base: &str, with_cloudinary: bool) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_body_bytes: 64 * 1024,
        replicate: ReplicateConfig {
            api_token: TEST_TOKEN.to_string(),
            api_base: upstream_base.to_string(),
            model: TEST_MODEL.to_string(),
        },
        cloudinary: with_cloudinary.then(|| CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "key-123".to_string(),
            api_secret: "secret-xyz".to_string(),
        }),
    }
}

/// Build the full application router against the mocks.
pub fn build_test_app(upstream_base: &str, with_cloudinary: bool) -> Router {
    let config = test_config(upstream_base, with_cloudinary);
    let replicate = ReplicateApi::new(
        config.replicate.api_base.clone(),
        config.replicate.api_token.clone(),
    );
    let cloudinary = config.cloudinary.as_ref().map(|c| {
        Arc::new(
            CloudinaryClient::new(c.cloud_name.clone())
                .with_credentials(c.api_key.clone(), c.api_secret.clone())
                .with_api_base(format!("{upstream_base}/cloudinary")),
        )
    });
    let state = AppState {
        config: Arc::new(config.clone()),
        replicate: Arc::new(replicate),
        cloudinary,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
