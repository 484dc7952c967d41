//! `mashup generate`: run one job end to end.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use mashup_cloudinary::CloudinaryClient;
use mashup_core::history::{HistoryStore, NewHistoryEntry};
use mashup_pipeline::{
    Controller, ControllerConfig, GenerationRequest, JpegTransform, ProgressUpdate, ProxyClient,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::source;

/// How long to wait for remote cancels before exiting.
const CANCEL_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Sofa photo: local path or URL.
    #[arg(long)]
    sofa: String,

    /// Fabric swatch: local path or URL.
    #[arg(long)]
    fabric: String,

    /// Extra instructions appended to the prompt.
    #[arg(long)]
    details: Option<String>,

    /// Where to save the result (default: `canape-mashup-<epoch ms>.<ext>`).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Host local inputs and the result on Cloudinary.
    #[arg(long)]
    upload: bool,

    #[arg(long, env = "CLOUDINARY_CLOUD_NAME")]
    cloud_name: Option<String>,

    #[arg(long, env = "CLOUDINARY_UPLOAD_PRESET")]
    upload_preset: Option<String>,
}

pub async fn run(args: GenerateArgs, api_url: &str, history_path: &Path) -> Result<()> {
    let uploader = if args.upload {
        let (Some(cloud), Some(preset)) = (args.cloud_name.clone(), args.upload_preset.clone()) else {
            bail!("--upload needs CLOUDINARY_CLOUD_NAME and CLOUDINARY_UPLOAD_PRESET");
        };
        Some(CloudinaryClient::new(cloud).with_upload_preset(preset))
    } else {
        None
    };

    let sofa = source::resolve(&args.sofa, uploader.as_ref()).await?;
    let fabric = source::resolve(&args.fabric, uploader.as_ref()).await?;
    let mut request = GenerationRequest::new(sofa, fabric);
    if let Some(details) = args.details.clone() {
        request = request.with_details(details);
    }

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressUpdate>();
    let printer = tokio::spawn(async move {
        while let Some(update) = progress_rx.recv().await {
            println!("{update}");
        }
    });

    let controller = Controller::new(
        Arc::new(ProxyClient::new(api_url.to_string())),
        Arc::new(JpegTransform::new()),
        Arc::new(progress_tx),
        ControllerConfig::default(),
    )?;

    let abort = CancellationToken::new();
    let ctrl_c = {
        let abort = abort.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, aborting");
                abort.cancel();
            }
        })
    };

    let outcome = controller.run(request, abort).await;
    ctrl_c.abort();
    // A stalled or aborted job leaves a remote cancel in flight.
    controller.wait_for_cancels(CANCEL_GRACE).await;
    // Dropping the controller closes the progress channel.
    drop(controller);
    let _ = printer.await;

    let image = match outcome {
        Ok(image) => image,
        Err(e) if e.is_retryable() => bail!("{e} (try again in a few minutes)"),
        Err(e) => return Err(e.into()),
    };
    tracing::info!(
        prediction_id = %image.prediction_id,
        attempts = image.attempts,
        polls = image.polls,
        "Generation complete",
    );

    let now_ms = chrono::Utc::now().timestamp_millis();
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(default_output_name(now_ms, &image.image_url)));
    download(&image.image_url, &output).await?;
    println!("Saved {}", output.display());

    let mut entry = NewHistoryEntry {
        image_url: image.image_url.clone(),
        thumbnail_url: None,
        user_details: args.details,
    };
    if let Some(uploader) = &uploader {
        match uploader.upload_from_url(&image.image_url).await {
            Ok(hosted) => {
                entry.image_url = hosted.image_url;
                entry.thumbnail_url = Some(hosted.thumbnail_url);
            }
            Err(e) => tracing::warn!(error = %e, "Could not re-host result, keeping provider URL"),
        }
    }

    let history = HistoryStore::new(history_path);
    match history.add(entry) {
        Ok(entries) => tracing::debug!(count = entries.len(), "History updated"),
        Err(e) => tracing::warn!(error = %e, path = %history.path().display(), "Could not save history"),
    }
    Ok(())
}

async fn download(url: &str, path: &Path) -> Result<()> {
    let bytes = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .with_context(|| format!("Failed to download {url}"))?
        .bytes()
        .await
        .context("Failed to read result body")?;
    tokio::fs::write(path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// `canape-mashup-<epoch ms>.<ext>`, with the extension taken from the
/// result URL when it is a known image type.
pub fn default_output_name(epoch_ms: i64, image_url: &str) -> String {
    let path = image_url.split(['?', '#']).next().unwrap_or_default();
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "webp"))
        .unwrap_or_else(|| "jpg".to_string());
    format!("canape-mashup-{epoch_ms}.{ext}")
}
