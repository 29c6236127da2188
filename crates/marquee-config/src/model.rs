//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers; parsing lives in `loader.rs`.
//! - The operator token never appears in `Debug` output.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::{ConfigError, ConfigResult};

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: IpAddr,
    /// Port the HTTP listener binds to.
    pub http_port: u16,
    /// Connection string for the device registry and feed tables.
    pub database_url: String,
    /// Permanent ingestion namespace served to devices.
    pub namespace_root: PathBuf,
    /// Directory receiving upload temporaries before relocation.
    pub staging_dir: PathBuf,
    /// Batch ingestion limits and behaviour.
    pub ingest: IngestPolicy,
    /// Optional token guarding operator routes.
    pub admin_token: Option<AdminToken>,
    /// Logging preferences.
    pub telemetry: TelemetryConfig,
}

impl ServerConfig {
    /// Socket address for the HTTP listener.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }

    /// Create the namespace root and staging directory when missing.
    ///
    /// # Errors
    ///
    /// Returns an error if either directory cannot be created.
    pub fn ensure_directories(&self) -> ConfigResult<()> {
        std::fs::create_dir_all(&self.namespace_root).map_err(|source| ConfigError::Io {
            operation: "namespace_root.create",
            source,
        })?;
        std::fs::create_dir_all(&self.staging_dir).map_err(|source| ConfigError::Io {
            operation: "staging_dir.create",
            source,
        })
    }
}

/// Limits applied to batch uploads.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IngestPolicy {
    /// Maximum number of files accepted in one batch.
    pub max_batch_files: usize,
    /// Maximum accepted request body size in bytes.
    pub max_upload_bytes: usize,
    /// Optional deadline for answering the uploader.
    pub batch_timeout: Option<Duration>,
    /// Whether an upload replaces an existing file with the same name.
    pub overwrite_existing: bool,
}

/// Logging preferences resolved from the environment.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Fallback filter used when `RUST_LOG` is absent.
    pub log_level: String,
    /// Requested output format (`json` or `pretty`).
    pub log_format: Option<String>,
}

/// Shared secret presented by operators in the `x-marquee-admin-token` header.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminToken(String);

impl AdminToken {
    /// Wrap a raw token value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Compare a presented token with the configured one.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();
        if expected.len() != presented.len() {
            return false;
        }
        expected
            .iter()
            .zip(presented)
            .fold(0_u8, |acc, (left, right)| acc | (left ^ right))
            == 0
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("AdminToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_token_matches_exact_value_only() {
        let token = AdminToken::new("s3cret".to_string());
        assert!(token.matches("s3cret"));
        assert!(!token.matches("s3cre"));
        assert!(!token.matches("S3cret"));
        assert_eq!(format!("{token:?}"), "AdminToken(<redacted>)");
    }

    #[test]
    fn ingest_policy_serialises_timeout() -> Result<(), serde_json::Error> {
        let policy = IngestPolicy {
            max_batch_files: 12,
            max_upload_bytes: 1024,
            batch_timeout: Some(Duration::from_secs(5)),
            overwrite_existing: true,
        };
        let value = serde_json::to_value(&policy)?;
        assert_eq!(value["max_batch_files"], 12);
        assert_eq!(value["batch_timeout"]["secs"], 5);
        Ok(())
    }
}
