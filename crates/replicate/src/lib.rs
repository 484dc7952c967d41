//! Replicate REST client library.
//!
//! Provides typed prediction payloads and an HTTP wrapper for creating,
//! polling and cancelling predictions on the Replicate API.

pub mod api;
pub mod input;
pub mod prediction;

pub use api::{ReplicateApi, ReplicateApiError, DEFAULT_API_BASE};
pub use input::{MashupInput, DEFAULT_MODEL};
pub use prediction::Prediction;
