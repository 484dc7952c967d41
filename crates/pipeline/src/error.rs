use crate::transform::TransformError;

/// Terminal failure of a generation job.
///
/// Messages are written for direct display to the user. A payload
/// rejected as too large is not an error here: the submitter reports it
/// as [`SubmitOutcome::Oversize`](crate::submitter::SubmitOutcome) and the
/// controller degrades the inputs instead.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The service answered with success but the body was unusable.
    #[error("Malformed response from the generation service: {0}")]
    Protocol(String),

    /// The create call was rejected for a reason other than size.
    #[error("Could not start the generation: {0}")]
    Submission(String),

    /// The remote model reported a failure.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// The remote prediction was canceled.
    #[error("The generation was canceled")]
    Canceled,

    /// The job stalled in the provider's queue and was canceled.
    #[error("{0}")]
    Overload(String),

    /// The poll budget ran out.
    #[error("Generation took too long (max 120s)")]
    Timeout,

    /// Every compression level was rejected as too large.
    #[error("Images too large even after maximum compression")]
    PayloadTooLarge,

    /// An input image could not be re-encoded.
    #[error("Could not prepare images: {0}")]
    Transform(#[from] TransformError),

    /// The proxy could not be reached.
    #[error("Network error: {0}")]
    Transport(String),

    /// The caller aborted the job.
    #[error("Generation aborted")]
    Aborted,
}

impl GenerationError {
    /// Whether trying the same request again later may succeed.
    ///
    /// The controller never retries on its own; this only informs the
    /// caller's presentation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Overload(_) | Self::Timeout | Self::Transport(_))
    }
}
