//! Shared fakes for controller integration tests.
//!
//! Tests run under a paused tokio clock, so the real cadence (1 s / 2 s
//! waits, 1 s retry delay) is exercised without wall-clock time passing.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mashup_core::compression::CompressionLevel;
use mashup_core::proxy::{CreateJobRequest, CreateJobResponse, PollResponse};
use mashup_core::types::{ImageRef, JobStatus};
use mashup_pipeline::backend::{BackendError, GenerationBackend};
use mashup_pipeline::job::SourceImage;
use mashup_pipeline::progress::{ProgressSink, ProgressUpdate};
use mashup_pipeline::transform::{ImageTransform, TransformError};
use mashup_pipeline::{Controller, ControllerConfig, GenerationRequest};
use tokio::time::Instant;

pub const RESULT_URL: &str = "https://replicate.delivery/out.jpg";

// ---------------------------------------------------------------------------
// Scripted backend
// ---------------------------------------------------------------------------

pub enum CreateStep {
    Accept(&'static str),
    NoId,
    Status(u16, Option<&'static str>),
    Transport,
}

pub enum PollStep {
    Status(JobStatus),
    Queued(JobStatus, f64),
    Succeeded(&'static str),
    Failed(Option<&'static str>),
    HttpError(u16),
}

/// Replays a fixed script of create and poll answers and records every
/// call it receives.
///
/// Once the poll script is exhausted every further poll answers
/// `processing`.
#[derive(Default)]
pub struct ScriptedBackend {
    creates: Mutex<VecDeque<CreateStep>>,
    polls: Mutex<VecDeque<PollStep>>,
    pub create_requests: Mutex<Vec<CreateJobRequest>>,
    pub poll_times: Mutex<Vec<Instant>>,
    pub cancels: Mutex<Vec<String>>,
    fail_cancels: bool,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(self, step: CreateStep) -> Self {
        self.creates.lock().unwrap().push_back(step);
        self
    }

    pub fn poll(self, step: PollStep) -> Self {
        self.polls.lock().unwrap().push_back(step);
        self
    }

    pub fn polls(self, step: impl Fn() -> PollStep, count: usize) -> Self {
        {
            let mut polls = self.polls.lock().unwrap();
            for _ in 0..count {
                polls.push_back(step());
            }
        }
        self
    }

    /// Every cancel call is recorded, then answered with HTTP 500.
    pub fn failing_cancels(mut self) -> Self {
        self.fail_cancels = true;
        self
    }

    pub fn create_count(&self) -> usize {
        self.create_requests.lock().unwrap().len()
    }

    pub fn poll_count(&self) -> usize {
        self.poll_times.lock().unwrap().len()
    }

    pub fn cancel_ids(&self) -> Vec<String> {
        self.cancels.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn create(&self, request: &CreateJobRequest) -> Result<CreateJobResponse, BackendError> {
        self.create_requests.lock().unwrap().push(request.clone());
        let step = self
            .creates
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected create call");
        match step {
            CreateStep::Accept(id) => Ok(CreateJobResponse {
                status: Some(JobStatus::Starting),
                prediction_id: Some(id.to_string()),
            }),
            CreateStep::NoId => Ok(CreateJobResponse {
                status: Some(JobStatus::Starting),
                prediction_id: None,
            }),
            CreateStep::Status(status, message) => Err(BackendError::Status {
                status,
                message: message.map(str::to_string),
            }),
            CreateStep::Transport => Err(BackendError::Transport("connection reset".into())),
        }
    }

    async fn poll(&self, _prediction_id: &str) -> Result<PollResponse, BackendError> {
        self.poll_times.lock().unwrap().push(Instant::now());
        let step = self
            .polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PollStep::Status(JobStatus::Processing));
        match step {
            PollStep::Status(status) => Ok(PollResponse::new(status)),
            PollStep::Queued(status, queue_time) => {
                let mut response = PollResponse::new(status);
                response.queue_time = Some(queue_time);
                Ok(response)
            }
            PollStep::Succeeded(url) => {
                let mut response = PollResponse::new(JobStatus::Succeeded);
                response.image_url = Some(serde_json::json!([url]));
                Ok(response)
            }
            PollStep::Failed(message) => {
                let mut response = PollResponse::new(JobStatus::Failed);
                response.message = message.map(str::to_string);
                Ok(response)
            }
            PollStep::HttpError(status) => Err(BackendError::Status {
                status,
                message: None,
            }),
        }
    }

    async fn cancel(&self, prediction_id: &str) -> Result<(), BackendError> {
        self.cancels.lock().unwrap().push(prediction_id.to_string());
        if self.fail_cancels {
            return Err(BackendError::Status {
                status: 500,
                message: Some("cancel failed".into()),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recording transform and progress
// ---------------------------------------------------------------------------

/// Encodes nothing; returns a data URL naming the level it was asked for.
/// Records the level and a label of the source of every call.
#[derive(Default)]
pub struct RecordingTransform {
    pub levels: Mutex<Vec<CompressionLevel>>,
    pub sources: Mutex<Vec<String>>,
}

impl RecordingTransform {
    pub fn levels(&self) -> Vec<CompressionLevel> {
        self.levels.lock().unwrap().clone()
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().unwrap().clone()
    }
}

/// `Url` sources label as the URL, `Bytes` as `bytes:[..]`.
pub fn source_label(source: &SourceImage) -> String {
    match source {
        SourceImage::Url(url) => url.clone(),
        SourceImage::Bytes(bytes) => format!("bytes:{:?}", &bytes[..]),
    }
}

#[async_trait]
impl ImageTransform for RecordingTransform {
    async fn encode(
        &self,
        source: &SourceImage,
        level: CompressionLevel,
    ) -> Result<ImageRef, TransformError> {
        self.levels.lock().unwrap().push(level);
        self.sources.lock().unwrap().push(source_label(source));
        Ok(ImageRef::inline(
            "image/jpeg",
            &format!("{}q{}", level.max_dimension, level.quality),
        ))
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub updates: Mutex<Vec<ProgressUpdate>>,
}

impl RecordingProgress {
    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn polling_updates(&self) -> Vec<ProgressUpdate> {
        self.updates()
            .into_iter()
            .filter(|u| matches!(u, ProgressUpdate::Polling { .. }))
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn report(&self, update: ProgressUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub backend: Arc<ScriptedBackend>,
    pub transform: Arc<RecordingTransform>,
    pub progress: Arc<RecordingProgress>,
    pub controller: Controller,
}

pub fn harness(backend: ScriptedBackend) -> Harness {
    harness_with_config(backend, ControllerConfig::default())
}

pub fn harness_with_config(backend: ScriptedBackend, config: ControllerConfig) -> Harness {
    let backend = Arc::new(backend);
    let transform = Arc::new(RecordingTransform::default());
    let progress = Arc::new(RecordingProgress::default());
    let controller = Controller::new(
        backend.clone(),
        transform.clone(),
        progress.clone(),
        config,
    )
    .expect("valid config");
    Harness {
        backend,
        transform,
        progress,
        controller,
    }
}

pub const SOFA_URL: &str = "https://res.cloudinary.com/demo/sofa.jpg";
pub const FABRIC_URL: &str = "https://res.cloudinary.com/demo/fabric.jpg";

pub fn url_request() -> GenerationRequest {
    GenerationRequest::new(
        SourceImage::Url(SOFA_URL.into()),
        SourceImage::Url(FABRIC_URL.into()),
    )
}

pub fn bytes_request() -> GenerationRequest {
    GenerationRequest::new(
        SourceImage::from_bytes(vec![1u8, 2, 3]),
        SourceImage::from_bytes(vec![4u8, 5, 6]),
    )
}
