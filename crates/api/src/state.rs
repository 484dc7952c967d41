use std::sync::Arc;

use mashup_cloudinary::CloudinaryClient;
use mashup_replicate::ReplicateApi;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub replicate: Arc<ReplicateApi>,
    /// Present only when signed Cloudinary operations are configured.
    pub cloudinary: Option<Arc<CloudinaryClient>>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let replicate = ReplicateApi::new(
            config.replicate.api_base.clone(),
            config.replicate.api_token.clone(),
        );
        let cloudinary = config.cloudinary.as_ref().map(|c| {
            Arc::new(
                CloudinaryClient::new(c.cloud_name.clone())
                    .with_credentials(c.api_key.clone(), c.api_secret.clone()),
            )
        });

        Self {
            config: Arc::new(config),
            replicate: Arc::new(replicate),
            cloudinary,
        }
    }
}
