//! Payload shrinking for submissions rejected as too large.

use std::sync::Arc;

use mashup_core::compression::{CompressionLadder, CompressionLevel};
use mashup_core::types::ImageRef;

use crate::error::GenerationError;
use crate::job::{GenerationRequest, JobInputs, SourceImage};
use crate::transform::ImageTransform;

/// Re-encodes the caller's original images along a [`CompressionLadder`].
pub struct Degrader {
    transform: Arc<dyn ImageTransform>,
    ladder: CompressionLadder,
}

impl Degrader {
    pub fn new(transform: Arc<dyn ImageTransform>, ladder: CompressionLadder) -> Self {
        Self { transform, ladder }
    }

    /// Inputs for the first submission.
    ///
    /// URL sources pass through untouched; byte sources are encoded at
    /// ladder level 0.
    pub async fn prepare_initial(&self, request: &GenerationRequest) -> Result<JobInputs, GenerationError> {
        let level = self.ladder.initial();
        let (sofa, fabric) = tokio::try_join!(
            self.prepare_one(&request.sofa, level),
            self.prepare_one(&request.fabric, level),
        )?;
        Ok(JobInputs { sofa, fabric })
    }

    /// Inputs for degrade cycle `attempt` (1-based), both images encoded
    /// from the originals at ladder level `attempt`.
    pub async fn degrade(
        &self,
        request: &GenerationRequest,
        attempt: usize,
    ) -> Result<(JobInputs, CompressionLevel), GenerationError> {
        let level = self.ladder.level(attempt).ok_or(GenerationError::PayloadTooLarge)?;
        let (sofa, fabric) = tokio::try_join!(
            self.transform.encode(&request.sofa, level),
            self.transform.encode(&request.fabric, level),
        )?;
        tracing::info!(
            attempt,
            max_dimension = level.max_dimension,
            quality = level.quality,
            "Degraded inputs",
        );
        Ok((JobInputs { sofa, fabric }, level))
    }

    async fn prepare_one(
        &self,
        source: &SourceImage,
        level: CompressionLevel,
    ) -> Result<ImageRef, GenerationError> {
        match source {
            SourceImage::Url(url) => Ok(ImageRef::Url(url.clone())),
            SourceImage::Bytes(_) => Ok(self.transform.encode(source, level).await?),
        }
    }
}
