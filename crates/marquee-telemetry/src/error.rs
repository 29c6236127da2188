//! Error types for telemetry operations.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::string::FromUtf8Error;

use prometheus::Error as PrometheusError;
use tracing_subscriber::util::TryInitError;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised by telemetry helpers.
#[derive(Debug)]
pub enum TelemetryError {
    /// A global subscriber was already installed, or installation failed.
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: TryInitError,
    },
    /// A collector could not be built or registered.
    Collector {
        /// `collector.build` or `collector.register`.
        operation: &'static str,
        /// Metric name.
        name: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// The registry could not be rendered in the exposition format.
    Exposition {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// The rendered exposition was not UTF-8.
    ExpositionEncoding {
        /// Underlying conversion error.
        source: FromUtf8Error,
    },
}

impl Display for TelemetryError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::SubscriberInstall { .. } => "tracing subscriber could not be installed",
            Self::Collector { .. } => "metrics collector setup failed",
            Self::Exposition { .. } => "metrics exposition failed",
            Self::ExpositionEncoding { .. } => "metrics exposition was not utf-8",
        };
        formatter.write_str(message)
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SubscriberInstall { source } => Some(source),
            Self::Collector { source, .. } | Self::Exposition { source } => Some(source),
            Self::ExpositionEncoding { source } => Some(source),
        }
    }
}
