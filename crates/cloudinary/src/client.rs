//! HTTP client for the Cloudinary upload API.

use serde::Deserialize;

use crate::signing::sign_destroy;
use crate::urls::{thumbnail_url, webp_url};

/// Cloudinary upload API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Folder receiving generated results.
pub const RESULTS_FOLDER: &str = "france-canape-results";

/// Client bound to one Cloudinary cloud.
pub struct CloudinaryClient {
    client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    upload_preset: Option<String>,
    credentials: Option<Credentials>,
}

/// API key pair required for signed operations.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

/// A freshly uploaded input photo.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_url: String,
    pub public_id: String,
}

/// A generated result re-hosted on Cloudinary.
#[derive(Debug, Clone)]
pub struct HostedResult {
    /// WebP delivery URL.
    pub image_url: String,
    pub thumbnail_url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

/// Errors from the Cloudinary layer.
#[derive(Debug, thiserror::Error)]
pub enum CloudinaryError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Cloudinary returned a non-2xx status code.
    #[error("Cloudinary API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// The operation needs configuration that was not provided.
    #[error("Cloudinary is not configured: {0}")]
    NotConfigured(&'static str),
}

impl CloudinaryClient {
    pub fn new(cloud_name: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            cloud_name,
            upload_preset: None,
            credentials: None,
        }
    }

    /// Preset used for unsigned uploads.
    pub fn with_upload_preset(mut self, preset: String) -> Self {
        self.upload_preset = Some(preset);
        self
    }

    /// Key pair used for signed operations (`destroy`).
    pub fn with_credentials(mut self, api_key: String, api_secret: String) -> Self {
        self.credentials = Some(Credentials {
            api_key,
            api_secret,
        });
        self
    }

    /// Override the API base URL (used by tests).
    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Upload local image bytes with the unsigned preset.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        file_name: String,
    ) -> Result<UploadedFile, CloudinaryError> {
        let preset = self.preset()?;
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name))
            .text("upload_preset", preset.to_string());

        let uploaded = self.upload(form).await?;
        tracing::info!(public_id = %uploaded.public_id, "Uploaded input image");
        Ok(UploadedFile {
            file_url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }

    /// Copy a remote image into the results folder.
    ///
    /// Returns WebP and thumbnail delivery URLs for the stored copy.
    pub async fn upload_from_url(&self, image_url: &str) -> Result<HostedResult, CloudinaryError> {
        let preset = self.preset()?;
        let form = reqwest::multipart::Form::new()
            .text("file", image_url.to_string())
            .text("upload_preset", preset.to_string())
            .text("folder", RESULTS_FOLDER);

        let uploaded = self.upload(form).await?;
        tracing::info!(public_id = %uploaded.public_id, "Stored generated image");
        Ok(HostedResult {
            image_url: webp_url(&uploaded.secure_url),
            thumbnail_url: thumbnail_url(&uploaded.secure_url),
            public_id: uploaded.public_id,
        })
    }

    /// Delete an asset. Returns Cloudinary's JSON verdict
    /// (`{"result": "ok"}` on success, `{"result": "not found"}` otherwise).
    pub async fn destroy(
        &self,
        public_id: &str,
        timestamp: i64,
    ) -> Result<serde_json::Value, CloudinaryError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(CloudinaryError::NotConfigured("missing API credentials"))?;
        let signature = sign_destroy(public_id, timestamp, &creds.api_secret);
        let timestamp = timestamp.to_string();

        let response = self
            .client
            .post(format!("{}/{}/image/destroy", self.api_base, self.cloud_name))
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", creds.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;

        // Cloudinary reports most destroy failures in a 200 body, so the
        // verdict is returned for the caller to inspect.
        Ok(response.json().await?)
    }

    // ---- private helpers ----

    fn preset(&self) -> Result<&str, CloudinaryError> {
        self.upload_preset
            .as_deref()
            .ok_or(CloudinaryError::NotConfigured("missing upload preset"))
    }

    async fn upload(&self, form: reqwest::multipart::Form) -> Result<UploadResponse, CloudinaryError> {
        let response = self
            .client
            .post(format!("{}/{}/image/upload", self.api_base, self.cloud_name))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("Cloudinary upload failed")
                .to_string();
            return Err(CloudinaryError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}
