//! Inputs and per-invocation state of a generation job.

use std::sync::Arc;

use mashup_core::prompt::build_prompt;
use mashup_core::proxy::CreateJobRequest;
use mashup_core::types::{ImageRef, JobStatus};

/// Original image supplied by the caller.
///
/// Degrade cycles always re-encode from this value, never from a
/// previously degraded copy.
#[derive(Debug, Clone)]
pub enum SourceImage {
    /// Publicly reachable image; sent as-is until a degrade cycle.
    Url(String),
    /// Local image bytes; inline-encoded before the first submission.
    Bytes(Arc<[u8]>),
}

impl SourceImage {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes(bytes.into())
    }
}

/// What the caller asks for.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub sofa: SourceImage,
    pub fabric: SourceImage,
    /// Free text appended to the base prompt.
    pub user_details: Option<String>,
    /// Pin a specific model version instead of the proxy's default model.
    pub model_version: Option<String>,
}

impl GenerationRequest {
    pub fn new(sofa: SourceImage, fabric: SourceImage) -> Self {
        Self {
            sofa,
            fabric,
            user_details: None,
            model_version: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.user_details = Some(details.into());
        self
    }

    pub fn prompt(&self) -> String {
        build_prompt(self.user_details.as_deref())
    }
}

/// The two images as currently sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInputs {
    pub sofa: ImageRef,
    pub fabric: ImageRef,
}

/// One generation attempt, owned by a single controller invocation.
#[derive(Debug)]
pub struct Job {
    /// Assigned by the service once a submission is accepted.
    pub id: Option<String>,
    pub status: Option<JobStatus>,
    pub inputs: JobInputs,
    /// Degrade cycles consumed.
    pub attempt: usize,
    /// Status checks issued for the current id.
    pub poll_count: usize,
    /// Last queue time reported by the service, in seconds.
    pub queue_time: Option<f64>,
    prompt: String,
    model_version: Option<String>,
}

impl Job {
    pub fn new(request: &GenerationRequest, inputs: JobInputs) -> Self {
        Self {
            id: None,
            status: None,
            inputs,
            attempt: 0,
            poll_count: 0,
            queue_time: None,
            prompt: request.prompt(),
            model_version: request.model_version.clone(),
        }
    }

    /// Body of the next create call.
    pub fn create_request(&self) -> CreateJobRequest {
        CreateJobRequest {
            sofa_image_url: self.inputs.sofa.clone(),
            fabric_image_url: self.inputs.fabric.clone(),
            prompt: self.prompt.clone(),
            model_version: self.model_version.clone(),
        }
    }
}
