//! Compression ladder used to shrink input images after the generation
//! service rejects a payload as too large.
//!
//! Level 0 is the fidelity applied before the first submission. Each
//! degrade cycle moves one step down the ladder.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default ladder: `(max_dimension, quality)` from full fidelity down.
pub const DEFAULT_COMPRESSION_LEVELS: [CompressionLevel; 3] = [
    CompressionLevel::new(1536, 85),
    CompressionLevel::new(1024, 75),
    CompressionLevel::new(768, 60),
];

/// Upper bound for the JPEG quality factor.
pub const MAX_QUALITY: u8 = 100;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One step of the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionLevel {
    /// Neither output dimension may exceed this many pixels.
    pub max_dimension: u32,
    /// JPEG quality factor (1-100).
    pub quality: u8,
}

impl CompressionLevel {
    pub const fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension,
            quality,
        }
    }

    /// Output dimensions for a `width` x `height` source.
    ///
    /// Aspect ratio is preserved and images already within bounds are
    /// left at their original size.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        let longest = width.max(height);
        if longest <= self.max_dimension || longest == 0 {
            return (width, height);
        }
        let scale = self.max_dimension as f64 / longest as f64;
        let w = ((width as f64 * scale).round() as u32).clamp(1, self.max_dimension);
        let h = ((height as f64 * scale).round() as u32).clamp(1, self.max_dimension);
        (w, h)
    }
}

/// A validated, non-empty ladder whose levels never increase in either
/// field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionLadder {
    levels: Vec<CompressionLevel>,
}

impl CompressionLadder {
    pub fn new(levels: Vec<CompressionLevel>) -> Result<Self, CoreError> {
        if levels.is_empty() {
            return Err(CoreError::Validation(
                "compression ladder must contain at least one level".to_string(),
            ));
        }
        for level in &levels {
            if level.max_dimension == 0 {
                return Err(CoreError::Validation(
                    "compression max_dimension must be positive".to_string(),
                ));
            }
            if level.quality == 0 || level.quality > MAX_QUALITY {
                return Err(CoreError::Validation(format!(
                    "compression quality must be within 1..={MAX_QUALITY}, got {}",
                    level.quality
                )));
            }
        }
        for pair in levels.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.max_dimension > prev.max_dimension || next.quality > prev.quality {
                return Err(CoreError::Validation(format!(
                    "compression levels must be non-increasing: {prev:?} is followed by {next:?}"
                )));
            }
        }
        Ok(Self { levels })
    }

    /// Level applied before the first submission.
    pub fn initial(&self) -> CompressionLevel {
        self.levels[0]
    }

    /// Level for a given degrade attempt, or `None` past the end.
    pub fn level(&self, attempt: usize) -> Option<CompressionLevel> {
        self.levels.get(attempt).copied()
    }

    /// Number of degrade cycles this ladder can serve.
    pub fn max_degrade_cycles(&self) -> usize {
        self.levels.len() - 1
    }
}

impl Default for CompressionLadder {
    fn default() -> Self {
        Self {
            levels: DEFAULT_COMPRESSION_LEVELS.to_vec(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
