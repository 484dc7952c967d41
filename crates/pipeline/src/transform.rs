//! Image re-encoding used for inline submission and payload degradation.

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use mashup_core::compression::CompressionLevel;
use mashup_core::types::ImageRef;

use crate::job::SourceImage;

/// Turns a source image into an inline payload at a given fidelity.
#[async_trait]
pub trait ImageTransform: Send + Sync {
    async fn encode(
        &self,
        source: &SourceImage,
        level: CompressionLevel,
    ) -> Result<ImageRef, TransformError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("failed to download source image: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("failed to decode or encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("encoding task failed: {0}")]
    Task(String),
}

/// Downscales with a triangle filter and encodes as baseline JPEG.
pub struct JpegTransform {
    client: reqwest::Client,
}

impl JpegTransform {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &str) -> Result<Arc<[u8]>, TransformError> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(Arc::from(bytes.as_ref()))
    }
}

impl Default for JpegTransform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageTransform for JpegTransform {
    async fn encode(
        &self,
        source: &SourceImage,
        level: CompressionLevel,
    ) -> Result<ImageRef, TransformError> {
        let bytes = match source {
            SourceImage::Url(url) => self.fetch(url).await?,
            SourceImage::Bytes(bytes) => Arc::clone(bytes),
        };

        let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&bytes, level))
            .await
            .map_err(|e| TransformError::Task(e.to_string()))??;

        tracing::debug!(
            max_dimension = level.max_dimension,
            quality = level.quality,
            encoded_bytes = jpeg.len(),
            "Re-encoded image",
        );
        Ok(ImageRef::inline("image/jpeg", &BASE64.encode(jpeg)))
    }
}

/// Decode `bytes`, fit them inside `level.max_dimension` and encode as
/// JPEG at `level.quality`.
///
/// Transparent pixels are flattened since JPEG has no alpha channel.
pub fn encode_jpeg(bytes: &[u8], level: CompressionLevel) -> Result<Vec<u8>, TransformError> {
    let image = image::load_from_memory(bytes)?;
    let (width, height) = level.fit(image.width(), image.height());
    let image = if (width, height) == (image.width(), image.height()) {
        image
    } else {
        image.resize_exact(width, height, FilterType::Triangle)
    };

    let rgb = image.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, level.quality).encode_image(&rgb)?;
    Ok(out.into_inner())
}
