//! Advisory progress reporting.
//!
//! Updates are delivered in the order they happen and never block the
//! controller: a sink that cannot keep up (or has gone away) simply
//! misses updates.

use std::fmt;

use mashup_core::compression::CompressionLevel;
use mashup_core::types::JobStatus;
use tokio::sync::mpsc;

/// One step of a job's life, as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressUpdate {
    /// Encoding local images before the first submission.
    Preparing,
    /// Sending the create call.
    Submitting { attempt: usize },
    /// Re-encoding after a size rejection.
    Degrading {
        attempt: usize,
        level: CompressionLevel,
    },
    /// A status check completed.
    Polling {
        /// 0-based index of the check.
        poll: usize,
        elapsed_secs: u64,
        status: JobStatus,
        /// Seconds spent waiting for a worker, when reported.
        queue_time_secs: Option<f64>,
    },
    /// A stuck or aborted prediction is being canceled.
    Canceling,
}

impl fmt::Display for ProgressUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preparing => write!(f, "Preparing images..."),
            Self::Submitting { attempt: 0 } => write!(f, "Starting generation..."),
            Self::Submitting { attempt } => write!(f, "Retrying with smaller images ({attempt})..."),
            Self::Degrading { level, .. } => write!(
                f,
                "Images too large, compressing to {}px at quality {}...",
                level.max_dimension, level.quality
            ),
            Self::Polling {
                elapsed_secs,
                status: JobStatus::Starting,
                queue_time_secs: Some(queue),
                ..
            } => write!(
                f,
                "Waiting for the AI server... ({elapsed_secs}s, queued {}s)",
                *queue as u64
            ),
            Self::Polling {
                elapsed_secs,
                status,
                queue_time_secs: Some(queue),
                ..
            } if !status.is_terminal() => write!(
                f,
                "Generating... ({elapsed_secs}s, queued {}s)",
                *queue as u64
            ),
            Self::Polling { elapsed_secs, .. } => {
                write!(f, "Generating... ({elapsed_secs}s)")
            }
            Self::Canceling => write!(f, "Canceling the request..."),
        }
    }
}

/// Destination for [`ProgressUpdate`]s.
pub trait ProgressSink: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Sink that drops every update.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

impl ProgressSink for mpsc::UnboundedSender<ProgressUpdate> {
    fn report(&self, update: ProgressUpdate) {
        // The receiver may have been dropped; progress is advisory.
        let _ = self.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polling_shows_elapsed_seconds() {
        let update = ProgressUpdate::Polling {
            poll: 10,
            elapsed_secs: 12,
            status: JobStatus::Processing,
            queue_time_secs: None,
        };
        assert_eq!(update.to_string(), "Generating... (12s)");
    }

    #[test]
    fn starting_shows_queue_time() {
        let update = ProgressUpdate::Polling {
            poll: 3,
            elapsed_secs: 4,
            status: JobStatus::Starting,
            queue_time_secs: Some(33.7),
        };
        assert_eq!(update.to_string(), "Waiting for the AI server... (4s, queued 33s)");
    }

    #[test]
    fn processing_with_queue_time_shows_it() {
        let update = ProgressUpdate::Polling {
            poll: 5,
            elapsed_secs: 6,
            status: JobStatus::Processing,
            queue_time_secs: Some(45.2),
        };
        assert_eq!(update.to_string(), "Generating... (6s, queued 45s)");
    }

    #[test]
    fn terminal_answer_hides_queue_time() {
        let update = ProgressUpdate::Polling {
            poll: 5,
            elapsed_secs: 6,
            status: JobStatus::Succeeded,
            queue_time_secs: Some(45.2),
        };
        assert_eq!(update.to_string(), "Generating... (6s)");
    }

    #[tokio::test]
    async fn channel_sink_preserves_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.report(ProgressUpdate::Preparing);
        tx.report(ProgressUpdate::Submitting { attempt: 0 });
        assert_eq!(rx.recv().await, Some(ProgressUpdate::Preparing));
        assert_eq!(rx.recv().await, Some(ProgressUpdate::Submitting { attempt: 0 }));
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.report(ProgressUpdate::Canceling);
    }
}
