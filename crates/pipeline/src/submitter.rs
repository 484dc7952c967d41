//! Create-call interpretation.

use mashup_core::proxy::CreateJobRequest;

use crate::backend::{BackendError, GenerationBackend};
use crate::error::GenerationError;

/// Non-fatal result of a create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The service accepted the job under this prediction id.
    Accepted(String),
    /// HTTP 413: the inputs must be shrunk before trying again.
    Oversize,
}

/// Send `request` and classify the answer.
pub async fn submit(
    backend: &dyn GenerationBackend,
    request: &CreateJobRequest,
) -> Result<SubmitOutcome, GenerationError> {
    match backend.create(request).await {
        Ok(response) => match response.prediction_id.filter(|id| !id.is_empty()) {
            Some(id) => Ok(SubmitOutcome::Accepted(id)),
            None => Err(GenerationError::Protocol("no prediction id received".to_string())),
        },
        Err(e) if e.is_payload_too_large() => Ok(SubmitOutcome::Oversize),
        Err(BackendError::Status { status, message }) => {
            tracing::warn!(status, message = ?message, "Create call rejected");
            Err(GenerationError::Submission(
                message.unwrap_or_else(|| "the generation service rejected the request".to_string()),
            ))
        }
        Err(BackendError::Transport(e)) => Err(GenerationError::Transport(e)),
    }
}
