//! HTTP implementation of [`GenerationBackend`] against the proxy
//! server's `/api/replicate` and `/api/replicate-cancel` endpoints.

use async_trait::async_trait;
use mashup_core::proxy::{
    error_message, CreateJobRequest, CreateJobResponse, PollResponse, PredictionRef,
};
use mashup_core::types::JobStatus;

use crate::backend::{BackendError, GenerationBackend};

/// Client for one proxy deployment.
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    /// * `base_url` - Proxy origin, e.g. `http://localhost:3000`.
    pub fn new(base_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(reqwest::StatusCode, serde_json::Value), BackendError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        // Error bodies are not guaranteed to be JSON (a 413 from a front
        // proxy is often plain text).
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let json = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);
        Ok((status, json))
    }
}

fn decode<T: serde::de::DeserializeOwned>(json: serde_json::Value) -> Result<T, BackendError> {
    serde_json::from_value(json).map_err(|e| BackendError::Transport(format!("invalid response body: {e}")))
}

#[async_trait]
impl GenerationBackend for ProxyClient {
    async fn create(&self, request: &CreateJobRequest) -> Result<CreateJobResponse, BackendError> {
        let (status, json) = self.post("/api/replicate", request).await?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_message(&json),
            });
        }
        decode(json)
    }

    async fn poll(&self, prediction_id: &str) -> Result<PollResponse, BackendError> {
        let body = PredictionRef {
            prediction_id: prediction_id.to_string(),
        };
        let (status, json) = self.post("/api/replicate", &body).await?;
        if status.is_success() {
            return decode(json);
        }
        // Some deployments answer a failed prediction with a 5xx that still
        // carries `status: "failed"`.
        if let Ok(parsed) = serde_json::from_value::<PollResponse>(json.clone()) {
            if parsed.status == JobStatus::Failed {
                return Ok(parsed);
            }
        }
        Err(BackendError::Status {
            status: status.as_u16(),
            message: error_message(&json),
        })
    }

    async fn cancel(&self, prediction_id: &str) -> Result<(), BackendError> {
        let body = PredictionRef {
            prediction_id: prediction_id.to_string(),
        };
        let (status, json) = self.post("/api/replicate-cancel", &body).await?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_message(&json),
            });
        }
        Ok(())
    }
}
