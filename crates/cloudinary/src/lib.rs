//! Cloudinary media storage client.
//!
//! Unsigned uploads (local bytes or remote URL) for hosting input photos
//! and results, signed deletion, and URL derivation helpers.

pub mod client;
pub mod signing;
pub mod urls;

pub use client::{CloudinaryClient, CloudinaryError, HostedResult, UploadedFile};
