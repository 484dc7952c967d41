//! Prediction objects returned by the Replicate API.

use chrono::{DateTime, Utc};
use mashup_core::types::JobStatus;
use serde::{Deserialize, Serialize};

/// A Replicate prediction as returned by create, get and cancel calls.
///
/// Only the fields the mashup pipeline reads are typed; `output`,
/// `error` and `metrics` stay as raw JSON because their shape depends on
/// the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub id: Option<String>,
    pub status: JobStatus,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metrics: Option<serde_json::Value>,
}

impl Prediction {
    /// URL of the generated image.
    ///
    /// Models that return a list yield its first element.
    pub fn output_url(&self) -> Option<String> {
        match self.output.as_ref()? {
            serde_json::Value::String(url) => Some(url.clone()),
            serde_json::Value::Array(items) => items.first()?.as_str().map(str::to_string),
            _ => None,
        }
    }

    /// Human-readable error reported by the model, if any.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(msg) if msg.trim().is_empty() => None,
            serde_json::Value::String(msg) => Some(msg.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Seconds the prediction has been waiting for a worker.
    ///
    /// Measured from `created_at` to `now`, and only reported while the
    /// prediction has not started running.
    pub fn queue_time_secs(&self, now: DateTime<Utc>) -> Option<f64> {
        if self.started_at.is_some() || self.status.is_terminal() {
            return None;
        }
        let created = self.created_at?;
        let waited = (now - created).num_milliseconds() as f64 / 1000.0;
        Some(waited.max(0.0))
    }
}
