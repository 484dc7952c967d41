//! Adaptive status polling with stall detection.
//!
//! Checks run every second for the first ten polls and every two seconds
//! afterwards. Two independent detectors watch for predictions that will
//! never finish on their own: a streak of `starting` answers, and a
//! reported queue time above the configured ceiling. Either one cancels
//! the prediction and ends the job with [`GenerationError::Overload`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mashup_core::types::JobStatus;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::backend::{BackendError, GenerationBackend};
use crate::config::ControllerConfig;
use crate::error::GenerationError;
use crate::job::Job;
use crate::progress::{ProgressSink, ProgressUpdate};

/// Message shown when a prediction never leaves `starting`.
pub const STUCK_STARTING_MESSAGE: &str = "AI server overloaded and not responding";

// ---------------------------------------------------------------------------
// Stall detection
// ---------------------------------------------------------------------------

/// Why a prediction is considered stuck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stall {
    /// Too many consecutive `starting` answers.
    StuckStarting,
    /// The service reported a queue time above the ceiling.
    Queued { minutes: u64 },
}

impl Stall {
    pub fn message(&self) -> String {
        match self {
            Self::StuckStarting => STUCK_STARTING_MESSAGE.to_string(),
            Self::Queued { minutes } => format!(
                "AI server overloaded: the request waited {minutes} min in the queue without starting"
            ),
        }
    }
}

/// Tracks the two stall heuristics across polls of one prediction.
#[derive(Debug)]
pub struct StallDetector {
    max_starting_polls: usize,
    max_queue_time: Duration,
    starting_streak: usize,
}

impl StallDetector {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            max_starting_polls: config.max_starting_polls,
            max_queue_time: config.max_queue_time,
            starting_streak: 0,
        }
    }

    pub fn starting_streak(&self) -> usize {
        self.starting_streak
    }

    /// Feed one non-terminal poll answer.
    pub fn observe(&mut self, status: &JobStatus, queue_time_secs: Option<f64>) -> Option<Stall> {
        if let Some(queued) = queue_time_secs {
            if queued > self.max_queue_time.as_secs_f64() {
                return Some(Stall::Queued {
                    minutes: (queued / 60.0).floor() as u64,
                });
            }
        }

        if *status == JobStatus::Starting {
            self.starting_streak += 1;
            if self.starting_streak > self.max_starting_polls {
                return Some(Stall::StuckStarting);
            }
        } else {
            // Any other non-terminal status counts as forward progress.
            self.starting_streak = 0;
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Abort helpers
// ---------------------------------------------------------------------------

/// Run `fut` unless `abort` fires first.
pub(crate) async fn abortable<F: Future>(
    abort: &CancellationToken,
    fut: F,
) -> Result<F::Output, GenerationError> {
    tokio::select! {
        biased;
        _ = abort.cancelled() => Err(GenerationError::Aborted),
        output = fut => Ok(output),
    }
}

/// Sleep for `delay` unless `abort` fires first.
pub(crate) async fn wait(abort: &CancellationToken, delay: Duration) -> Result<(), GenerationError> {
    abortable(abort, tokio::time::sleep(delay)).await
}

/// Ask the service to cancel `prediction_id` without waiting for the
/// answer. Failures are logged only.
///
/// The task is spawned on `tasks` so the host can wait for it before the
/// runtime shuts down.
pub fn cancel_in_background(
    tasks: &TaskTracker,
    backend: Arc<dyn GenerationBackend>,
    prediction_id: String,
) {
    tasks.spawn(async move {
        match backend.cancel(&prediction_id).await {
            Ok(()) => tracing::info!(prediction_id = %prediction_id, "Prediction canceled"),
            Err(e) => tracing::warn!(
                prediction_id = %prediction_id,
                error = %e,
                "Failed to cancel prediction",
            ),
        }
    });
}

// ---------------------------------------------------------------------------
// Poll loop
// ---------------------------------------------------------------------------

/// Polls one prediction until it reaches a terminal outcome.
pub struct Poller<'a> {
    backend: &'a Arc<dyn GenerationBackend>,
    config: &'a ControllerConfig,
    progress: &'a dyn ProgressSink,
    abort: &'a CancellationToken,
    cancels: &'a TaskTracker,
}

impl<'a> Poller<'a> {
    pub fn new(
        backend: &'a Arc<dyn GenerationBackend>,
        config: &'a ControllerConfig,
        progress: &'a dyn ProgressSink,
        abort: &'a CancellationToken,
        cancels: &'a TaskTracker,
    ) -> Self {
        Self {
            backend,
            config,
            progress,
            abort,
            cancels,
        }
    }

    /// Poll `prediction_id` and return the result image URL.
    ///
    /// Updates `job` with the status, poll count and queue time of every
    /// answer. Emits exactly one [`ProgressUpdate::Polling`] per answer.
    pub async fn run(&self, job: &mut Job, prediction_id: &str) -> Result<String, GenerationError> {
        let mut detector = StallDetector::new(self.config);
        job.poll_count = 0;

        for poll in 0..self.config.max_polls {
            wait(self.abort, self.config.poll_delay(poll))
                .await
                .inspect_err(|_| self.cancel(prediction_id))?;

            let response = abortable(self.abort, self.backend.poll(prediction_id))
                .await
                .inspect_err(|_| self.cancel(prediction_id))?
                .map_err(poll_error)?;

            job.poll_count = poll + 1;
            job.status = Some(response.status.clone());
            job.queue_time = response.queue_time;

            self.progress.report(ProgressUpdate::Polling {
                poll,
                elapsed_secs: self.config.elapsed_secs(poll),
                status: response.status.clone(),
                queue_time_secs: response.queue_time,
            });

            match response.status {
                JobStatus::Succeeded => {
                    return response.result_url().ok_or_else(|| {
                        GenerationError::Protocol("succeeded without an image URL".to_string())
                    });
                }
                JobStatus::Failed => {
                    return Err(GenerationError::Generation(
                        response
                            .message
                            .unwrap_or_else(|| "the model could not produce an image".to_string()),
                    ));
                }
                JobStatus::Canceled => return Err(GenerationError::Canceled),
                _ => {}
            }

            if let Some(stall) = detector.observe(&response.status, response.queue_time) {
                tracing::warn!(
                    prediction_id,
                    poll,
                    ?stall,
                    starting_streak = detector.starting_streak(),
                    queue_time = ?response.queue_time,
                    "Prediction stalled, canceling",
                );
                self.cancel(prediction_id);
                return Err(GenerationError::Overload(stall.message()));
            }

            tracing::debug!(prediction_id, poll, status = %response.status, "Prediction pending");
        }

        tracing::warn!(prediction_id, polls = self.config.max_polls, "Poll budget exhausted");
        Err(GenerationError::Timeout)
    }

    fn cancel(&self, prediction_id: &str) {
        self.progress.report(ProgressUpdate::Canceling);
        cancel_in_background(self.cancels, Arc::clone(self.backend), prediction_id.to_string());
    }
}

fn poll_error(err: BackendError) -> GenerationError {
    match err {
        BackendError::Status { message, .. } => GenerationError::Generation(
            message.unwrap_or_else(|| "status check failed".to_string()),
        ),
        BackendError::Transport(e) => GenerationError::Transport(e),
    }
}
