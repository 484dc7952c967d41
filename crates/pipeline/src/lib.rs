//! Generation job controller.
//!
//! Submits a sofa/fabric mashup to the proxy, polls the remote prediction
//! on a fast-then-slow cadence, shrinks the inputs and resubmits when the
//! payload is rejected as too large, and cancels predictions that stall
//! in the provider's queue. Each [`Controller::run`] yields exactly one
//! terminal outcome.

pub mod backend;
pub mod client;
pub mod config;
pub mod controller;
pub mod degrader;
pub mod error;
pub mod job;
pub mod poller;
pub mod progress;
pub mod submitter;
pub mod transform;

pub use backend::{BackendError, GenerationBackend};
pub use client::ProxyClient;
pub use config::ControllerConfig;
pub use controller::{Controller, GeneratedImage};
pub use error::GenerationError;
pub use job::{GenerationRequest, SourceImage};
pub use progress::{NoProgress, ProgressSink, ProgressUpdate};
pub use transform::{ImageTransform, JpegTransform, TransformError};
