//! Model input for the sofa/fabric mashup.

use serde::Serialize;

/// Default model: official model slug, latest version.
pub const DEFAULT_MODEL: &str = "google/nano-banana-pro";

/// Output resolution tier requested from the model.
pub const RESOLUTION: &str = "1K";
pub const ASPECT_RATIO: &str = "4:3";
pub const OUTPUT_FORMAT: &str = "jpg";
pub const SAFETY_FILTER_LEVEL: &str = "block_only_high";

/// `input` object of a mashup prediction.
///
/// Image order matters: the sofa comes first, the fabric second.
#[derive(Debug, Clone, Serialize)]
pub struct MashupInput {
    pub prompt: String,
    pub resolution: &'static str,
    pub image_input: [String; 2],
    pub aspect_ratio: &'static str,
    pub output_format: &'static str,
    pub safety_filter_level: &'static str,
}

impl MashupInput {
    pub fn new(prompt: String, sofa_image: String, fabric_image: String) -> Self {
        Self {
            prompt,
            resolution: RESOLUTION,
            image_input: [sofa_image, fabric_image],
            aspect_ratio: ASPECT_RATIO,
            output_format: OUTPUT_FORMAT,
            safety_filter_level: SAFETY_FILTER_LEVEL,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Plain strings and arrays: serialization cannot fail.
        serde_json::to_value(self).unwrap_or_default()
    }
}
