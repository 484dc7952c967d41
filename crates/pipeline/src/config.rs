//! Tunable parameters for submission, polling and payload degradation.

use std::time::Duration;

use mashup_core::compression::CompressionLadder;
use mashup_core::error::CoreError;

/// Controller configuration.
///
/// The defaults front-load polling (1 s for the first ten checks, 2 s
/// afterwards), give up after 90 checks, and allow two degrade cycles.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Wait before each of the first `fast_polls` checks.
    pub fast_interval: Duration,
    /// Wait before every later check.
    pub slow_interval: Duration,
    /// Number of checks using `fast_interval`.
    pub fast_polls: usize,
    /// Total status checks before giving up.
    pub max_polls: usize,
    /// Consecutive `starting` answers tolerated before the job is treated
    /// as stuck.
    pub max_starting_polls: usize,
    /// Reported queue time above which the job is treated as stuck.
    pub max_queue_time: Duration,
    /// Degrade-and-resubmit cycles allowed per job.
    pub max_retries: usize,
    /// Pause between a degrade cycle and the next submission.
    pub retry_delay: Duration,
    /// Compression ladder; level 0 is applied before the first submission.
    pub compression: CompressionLadder,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            fast_interval: Duration::from_secs(1),
            slow_interval: Duration::from_secs(2),
            fast_polls: 10,
            max_polls: 90,
            max_starting_polls: 40,
            max_queue_time: Duration::from_secs(120),
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            compression: CompressionLadder::default(),
        }
    }
}

impl ControllerConfig {
    /// Check that every degrade cycle has a compression level to use.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_retries > self.compression.max_degrade_cycles() {
            return Err(CoreError::Validation(format!(
                "max_retries ({}) exceeds the {} degrade levels available",
                self.max_retries,
                self.compression.max_degrade_cycles()
            )));
        }
        if self.max_polls == 0 {
            return Err(CoreError::Validation("max_polls must be positive".to_string()));
        }
        Ok(())
    }

    /// Wait before poll `index` (0-based).
    pub fn poll_delay(&self, index: usize) -> Duration {
        if index < self.fast_polls {
            self.fast_interval
        } else {
            self.slow_interval
        }
    }

    /// Whole seconds elapsed once poll `index` has waited.
    ///
    /// With the defaults: `i + 1` for `i < 10`, else `10 + (i - 9) * 2`.
    pub fn elapsed_secs(&self, index: usize) -> u64 {
        let fast = (index + 1).min(self.fast_polls) as u64;
        let slow = (index + 1).saturating_sub(self.fast_polls) as u64;
        (self.fast_interval * fast as u32 + self.slow_interval * slow as u32).as_secs()
    }
}
