//! Mashup proxy server library.
//!
//! Keeps the Replicate and Cloudinary secrets server-side and exposes the
//! create/poll, cancel and delete endpoints the generation pipeline talks
//! to. The building blocks are public so integration tests and the binary
//! entrypoint share them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
