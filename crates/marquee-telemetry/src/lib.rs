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

//! Telemetry primitives shared across the Marquee workspace.
//!
//! Layout: `init.rs` (subscriber installation), `layers.rs` (request-id
//! middleware), `metrics.rs` (Prometheus registry), `error.rs`.

pub mod error;
pub mod init;
pub mod layers;
pub mod metrics;

pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging, log_format_from_str,
};
pub use layers::{REQUEST_ID_HEADER, RequestIdLayers, request_id_layers};
pub use metrics::{AccessDecision, Metrics, MetricsSnapshot};
