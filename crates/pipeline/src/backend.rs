//! Transport seam between the controller and the generation service.

use async_trait::async_trait;
use mashup_core::proxy::{CreateJobRequest, CreateJobResponse, PollResponse};

/// Raw calls against the create, poll and cancel endpoints.
///
/// Implementations only move bytes; interpreting status codes and
/// statuses is the submitter's and poller's job.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn create(&self, request: &CreateJobRequest) -> Result<CreateJobResponse, BackendError>;

    async fn poll(&self, prediction_id: &str) -> Result<PollResponse, BackendError>;

    async fn cancel(&self, prediction_id: &str) -> Result<(), BackendError>;
}

/// Errors from a [`GenerationBackend`] call.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        /// `message` (or `error`) from the JSON body, if any.
        message: Option<String>,
    },

    /// The request never produced a usable response.
    #[error("{0}")]
    Transport(String),
}

impl BackendError {
    /// HTTP 413: the request body was too large.
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self, Self::Status { status: 413, .. })
    }
}
