//! REST API client for the Replicate predictions endpoints.
//!
//! Wraps prediction creation, status retrieval and cancellation using
//! [`reqwest`]. Non-2xx responses are surfaced with their status code and
//! body so callers can forward them unchanged.

use serde::Serialize;

use crate::prediction::Prediction;

/// Public Replicate API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.replicate.com/v1";

/// HTTP client for the Replicate API.
pub struct ReplicateApi {
    client: reqwest::Client,
    api_base: String,
    api_token: String,
}

/// Errors from the Replicate REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum ReplicateApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Replicate returned a non-2xx status code.
    #[error("Replicate API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl ReplicateApiError {
    /// HTTP status returned by Replicate, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
        }
    }

    /// The `detail` (or `error`) field of a JSON error body.
    pub fn detail(&self) -> Option<String> {
        let Self::ApiError { body, .. } = self else {
            return None;
        };
        let json: serde_json::Value = serde_json::from_str(body).ok()?;
        json.get("detail")
            .or_else(|| json.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}

#[derive(Serialize)]
struct VersionedRequest<'a> {
    version: &'a str,
    input: &'a serde_json::Value,
}

#[derive(Serialize)]
struct ModelRequest<'a> {
    input: &'a serde_json::Value,
}

impl ReplicateApi {
    /// Create a new API client.
    ///
    /// * `api_base`  - Base URL, e.g. [`DEFAULT_API_BASE`].
    /// * `api_token` - Bearer token sent with every request.
    pub fn new(api_base: String, api_token: String) -> Self {
        Self::with_client(reqwest::Client::new(), api_base, api_token)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_base: String, api_token: String) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Create a prediction against an official model's latest version.
    ///
    /// Sends `POST /models/{owner}/{name}/predictions`.
    pub async fn create_model_prediction(
        &self,
        model: &str,
        input: &serde_json::Value,
    ) -> Result<Prediction, ReplicateApiError> {
        let response = self
            .client
            .post(format!("{}/models/{}/predictions", self.api_base, model))
            .bearer_auth(&self.api_token)
            .json(&ModelRequest { input })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Create a prediction pinned to a specific model version.
    ///
    /// Sends `POST /predictions` with the version hash.
    pub async fn create_version_prediction(
        &self,
        version: &str,
        input: &serde_json::Value,
    ) -> Result<Prediction, ReplicateApiError> {
        let response = self
            .client
            .post(format!("{}/predictions", self.api_base))
            .bearer_auth(&self.api_token)
            .json(&VersionedRequest { version, input })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Retrieve the current state of a prediction.
    ///
    /// Sends `GET /predictions/{id}`.
    pub async fn get_prediction(&self, prediction_id: &str) -> Result<Prediction, ReplicateApiError> {
        let response = self
            .client
            .get(format!("{}/predictions/{}", self.api_base, prediction_id))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Cancel a queued or running prediction.
    ///
    /// Sends `POST /predictions/{id}/cancel` and returns the raw body.
    pub async fn cancel_prediction(
        &self,
        prediction_id: &str,
    ) -> Result<serde_json::Value, ReplicateApiError> {
        let response = self
            .client
            .post(format!("{}/predictions/{}/cancel", self.api_base, prediction_id))
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        tracing::debug!(prediction_id, status = %response.status(), "Replicate cancel response");
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ReplicateApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ReplicateApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ReplicateApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ReplicateApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
