//! JSON bodies exchanged between the generation pipeline and the proxy
//! server's `/api/replicate*` endpoints.

use serde::{Deserialize, Serialize};

use crate::types::{ImageRef, JobStatus};

/// Body of a create-job call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub sofa_image_url: ImageRef,
    pub fabric_image_url: ImageRef,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

/// Successful create-job answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub prediction_id: Option<String>,
}

/// Body of a poll-status or cancel call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRef {
    pub prediction_id: String,
}

/// Poll-status answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_id: Option<String>,
    /// Result location: a URL, or a list of URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<serde_json::Value>,
    /// Raw model output, accepted when `imageUrl` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Seconds the job has waited since creation without starting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Value>,
}

impl PollResponse {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            prediction_id: None,
            image_url: None,
            output: None,
            message: None,
            queue_time: None,
            metrics: None,
        }
    }

    /// The result image URL; a list yields its first element.
    pub fn result_url(&self) -> Option<String> {
        let value = self.image_url.as_ref().or(self.output.as_ref())?;
        match value {
            serde_json::Value::String(url) => Some(url.clone()),
            serde_json::Value::Array(items) => items.first()?.as_str().map(str::to_string),
            _ => None,
        }
    }
}

/// Human-readable `message` (or `error`) field of an error body.
pub fn error_message(body: &serde_json::Value) -> Option<String> {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}
