//! Errors surfaced by [`crate::ApiServer`] outside request handling.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Result alias for API server operations.
pub type ApiServerResult<T> = Result<T, ApiServerError>;

/// Listener failures. Per-request failures are [`crate::http::errors::ApiError`].
#[derive(Debug, Error)]
pub enum ApiServerError {
    /// The configured address could not be bound.
    #[error("api listener could not bind")]
    Bind {
        /// Requested listen address.
        addr: SocketAddr,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The accept loop ended with an error.
    #[error("api listener stopped")]
    Serve {
        /// Underlying IO error.
        source: io::Error,
    },
}
