use mashup_replicate::{DEFAULT_API_BASE, DEFAULT_MODEL};

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the
/// provider secrets, which must come from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body. Bigger bodies get HTTP 413.
    pub max_body_bytes: usize,
    pub replicate: ReplicateConfig,
    /// `None` unless cloud name, API key and secret are all set.
    pub cloudinary: Option<CloudinaryConfig>,
}

#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub api_token: String,
    pub api_base: String,
    /// `owner/name` slug used when a request does not pin a version.
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// 4.5 MiB, the body ceiling of common serverless hosts.
pub const DEFAULT_MAX_BODY_BYTES: usize = 4_718_592;

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                         |
    /// |-------------------------|---------------------------------|
    /// | `HOST`                  | `0.0.0.0`                       |
    /// | `PORT`                  | `3000`                          |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`         |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                            |
    /// | `MAX_BODY_BYTES`        | `4718592`                       |
    /// | `REPLICATE_API_TOKEN`   | (empty)                         |
    /// | `REPLICATE_API_BASE`    | `https://api.replicate.com/v1`  |
    /// | `REPLICATE_MODEL`       | `google/nano-banana-pro`        |
    /// | `CLOUDINARY_CLOUD_NAME` | (unset)                         |
    /// | `CLOUDINARY_API_KEY`    | (unset)                         |
    /// | `CLOUDINARY_API_SECRET` | (unset)                         |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_body_bytes: usize = std::env::var("MAX_BODY_BYTES")
            .map(|v| v.parse().expect("MAX_BODY_BYTES must be a valid usize"))
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        let replicate = ReplicateConfig {
            api_token: std::env::var("REPLICATE_API_TOKEN").unwrap_or_default(),
            api_base: std::env::var("REPLICATE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.into()),
            model: std::env::var("REPLICATE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
        };

        let cloudinary = match (
            non_empty_var("CLOUDINARY_CLOUD_NAME"),
            non_empty_var("CLOUDINARY_API_KEY"),
            non_empty_var("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => None,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_body_bytes,
            replicate,
            cloudinary,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
