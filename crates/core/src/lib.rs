//! Domain types shared by the mashup proxy server, the generation
//! pipeline and the command-line front end.

pub mod compression;
pub mod error;
pub mod history;
pub mod prompt;
pub mod proxy;
pub mod types;
