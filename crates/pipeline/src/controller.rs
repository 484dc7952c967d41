//! Job lifecycle: submit, degrade on oversize, poll to a terminal outcome.

use std::sync::Arc;
use std::time::Duration;

use mashup_core::error::CoreError;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::backend::GenerationBackend;
use crate::config::ControllerConfig;
use crate::degrader::Degrader;
use crate::error::GenerationError;
use crate::job::{GenerationRequest, Job, SourceImage};
use crate::poller::{abortable, wait, Poller};
use crate::progress::{ProgressSink, ProgressUpdate};
use crate::submitter::{submit, SubmitOutcome};
use crate::transform::ImageTransform;

/// Successful outcome of [`Controller::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Hosted URL of the mashup image.
    pub image_url: String,
    pub prediction_id: String,
    /// Degrade cycles consumed before the accepted submission.
    pub attempts: usize,
    /// Status checks issued for the accepted prediction.
    pub polls: usize,
}

/// Where a job is in its lifecycle. Terminal outcomes leave the loop.
#[derive(Debug)]
enum State {
    Submitting,
    Degrading,
    Polling(String),
}

/// Drives one generation job at a time per [`Controller::run`] call.
///
/// The controller holds no per-job state, so one instance can serve many
/// concurrent runs. Remote cancels issued by any run are tracked until
/// [`Controller::wait_for_cancels`] drains them.
pub struct Controller {
    backend: Arc<dyn GenerationBackend>,
    degrader: Degrader,
    progress: Arc<dyn ProgressSink>,
    config: ControllerConfig,
    cancels: TaskTracker,
}

impl Controller {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        transform: Arc<dyn ImageTransform>,
        progress: Arc<dyn ProgressSink>,
        config: ControllerConfig,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            backend,
            degrader: Degrader::new(transform, config.compression.clone()),
            progress,
            config,
            cancels: TaskTracker::new(),
        })
    }

    /// Wait up to `timeout` for background cancels to finish.
    ///
    /// [`Controller::run`] never waits on a cancel, so a host about to
    /// exit calls this to let pending cancel requests reach the service.
    /// Returns `false` if some were still in flight at the deadline.
    pub async fn wait_for_cancels(&self, timeout: Duration) -> bool {
        self.cancels.close();
        let drained = tokio::time::timeout(timeout, self.cancels.wait())
            .await
            .is_ok();
        if !drained {
            tracing::warn!(pending = self.cancels.len(), "Gave up waiting for prediction cancels");
        }
        self.cancels.reopen();
        drained
    }

    /// Run `request` to completion.
    ///
    /// Cancelling `abort` stops the job at its next await point. If a
    /// prediction was already accepted, a remote cancel is sent in the
    /// background and the run returns [`GenerationError::Aborted`].
    pub async fn run(
        &self,
        request: GenerationRequest,
        abort: CancellationToken,
    ) -> Result<GeneratedImage, GenerationError> {
        if abort.is_cancelled() {
            return Err(GenerationError::Aborted);
        }

        let has_local = matches!(request.sofa, SourceImage::Bytes(_))
            || matches!(request.fabric, SourceImage::Bytes(_));
        if has_local {
            self.progress.report(ProgressUpdate::Preparing);
        }
        let inputs = abortable(&abort, self.degrader.prepare_initial(&request)).await??;

        let mut job = Job::new(&request, inputs);
        let mut state = State::Submitting;

        loop {
            state = match state {
                State::Submitting => {
                    self.progress.report(ProgressUpdate::Submitting {
                        attempt: job.attempt,
                    });
                    let body = job.create_request();
                    match abortable(&abort, submit(self.backend.as_ref(), &body)).await?? {
                        SubmitOutcome::Accepted(id) => {
                            tracing::info!(prediction_id = %id, attempt = job.attempt, "Prediction created");
                            job.id = Some(id.clone());
                            State::Polling(id)
                        }
                        SubmitOutcome::Oversize if job.attempt >= self.config.max_retries => {
                            tracing::warn!(attempt = job.attempt, "Payload still too large, giving up");
                            return Err(GenerationError::PayloadTooLarge);
                        }
                        SubmitOutcome::Oversize => {
                            tracing::info!(attempt = job.attempt, "Payload too large, degrading");
                            State::Degrading
                        }
                    }
                }

                State::Degrading => {
                    job.attempt += 1;
                    let (inputs, level) =
                        abortable(&abort, self.degrader.degrade(&request, job.attempt)).await??;
                    self.progress.report(ProgressUpdate::Degrading {
                        attempt: job.attempt,
                        level,
                    });
                    job.inputs = inputs;
                    wait(&abort, self.config.retry_delay).await?;
                    State::Submitting
                }

                State::Polling(id) => {
                    let poller = Poller::new(
                        &self.backend,
                        &self.config,
                        self.progress.as_ref(),
                        &abort,
                        &self.cancels,
                    );
                    let image_url = match poller.run(&mut job, &id).await {
                        Ok(url) => url,
                        Err(e) => {
                            tracing::warn!(
                                prediction_id = %id,
                                polls = job.poll_count,
                                last_status = ?job.status,
                                queue_time = ?job.queue_time,
                                error = %e,
                                "Prediction did not succeed",
                            );
                            return Err(e);
                        }
                    };
                    tracing::info!(
                        prediction_id = %id,
                        polls = job.poll_count,
                        attempts = job.attempt,
                        "Prediction succeeded",
                    );
                    return Ok(GeneratedImage {
                        image_url,
                        prediction_id: id,
                        attempts: job.attempt,
                        polls: job.poll_count,
                    });
                }
            };
        }
    }
}
