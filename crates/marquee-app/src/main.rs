#![forbid(unsafe_code)]
#![warn(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs
)]

//! Binary entrypoint that loads configuration and serves the Marquee API.

use marquee_app::{AppResult, run_app};

/// Bootstraps Marquee and blocks until the listener stops.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
