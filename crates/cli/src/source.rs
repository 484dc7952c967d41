//! Turning command-line image arguments into pipeline inputs.

use std::path::Path;

use anyhow::{Context, Result};
use mashup_cloudinary::CloudinaryClient;
use mashup_pipeline::SourceImage;

/// Whether `arg` names a remote image rather than a local file.
pub fn is_remote(arg: &str) -> bool {
    arg.starts_with("https://") || arg.starts_with("http://")
}

/// Resolve one `--sofa`/`--fabric` argument.
///
/// URLs pass through. Local files are read into memory, or uploaded and
/// replaced by their hosted URL when `uploader` is given.
pub async fn resolve(arg: &str, uploader: Option<&CloudinaryClient>) -> Result<SourceImage> {
    if is_remote(arg) {
        return Ok(SourceImage::Url(arg.to_string()));
    }

    let path = Path::new(arg);
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;

    let Some(uploader) = uploader else {
        return Ok(SourceImage::from_bytes(bytes));
    };

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.jpg".to_string());
    let uploaded = uploader
        .upload_file(bytes, file_name)
        .await
        .with_context(|| format!("Failed to upload {}", path.display()))?;
    tracing::info!(file = %path.display(), url = %uploaded.file_url, "Uploaded input image");
    Ok(SourceImage::Url(uploaded.file_url))
}
