#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]

//! Environment-driven configuration for the Marquee server.
//!
//! Layout: `model.rs` (typed configuration), `loader.rs` (environment
//! parsing), `validate.rs` (field parsing helpers), `defaults.rs`.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{AdminToken, IngestPolicy, ServerConfig, TelemetryConfig};
