//! Prediction status and image reference types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a remote prediction, as reported by the generation service.
///
/// The service owns this enumeration. Values the pipeline does not know
/// about are preserved in [`JobStatus::Other`] and treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Starting => "starting",
            Self::Processing => "processing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Other(raw) => raw,
        }
    }

    /// Whether no further transitions can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "starting" => Self::Starting,
            "processing" => Self::Processing,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "canceled" => Self::Canceled,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image handed to the generation service.
///
/// Both forms travel in the same JSON string field; the service accepts
/// either a public URL or a `data:` URL with inline base64 content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ImageRef {
    Url(String),
    Inline(String),
}

impl ImageRef {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(s) | Self::Inline(s) => s,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }

    /// Build an inline reference from encoded bytes.
    pub fn inline(mime: &str, encoded_base64: &str) -> Self {
        Self::Inline(format!("data:{mime};base64,{encoded_base64}"))
    }
}

impl From<String> for ImageRef {
    fn from(raw: String) -> Self {
        if raw.starts_with("data:") {
            Self::Inline(raw)
        } else {
            Self::Url(raw)
        }
    }
}

impl From<ImageRef> for String {
    fn from(image: ImageRef) -> Self {
        match image {
            ImageRef::Url(s) | ImageRef::Inline(s) => s,
        }
    }
}
