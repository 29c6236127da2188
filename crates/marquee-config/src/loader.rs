//! Environment loader for [`ServerConfig`].
//!
//! # Design
//! - `from_env` reads the process environment; `from_lookup` accepts any
//!   lookup function so parsing stays testable without mutating globals.
//! - Unset variables fall back to `defaults.rs`; set-but-invalid variables fail.

use tracing::debug;

use crate::defaults;
use crate::error::ConfigResult;
use crate::model::{AdminToken, IngestPolicy, ServerConfig, TelemetryConfig};
use crate::validate::{
    non_empty, parse_bool, parse_bounded, parse_dir, parse_ip, parse_port, parse_secs,
};

/// Listen address variable.
pub const ENV_BIND_ADDR: &str = "MARQUEE_BIND_ADDR";
/// Listen port variable.
pub const ENV_HTTP_PORT: &str = "MARQUEE_HTTP_PORT";
/// Database connection string variable.
pub const ENV_DATABASE_URL: &str = "MARQUEE_DATABASE_URL";
/// Namespace root variable.
pub const ENV_NAMESPACE_ROOT: &str = "MARQUEE_NAMESPACE_ROOT";
/// Staging directory variable.
pub const ENV_STAGING_DIR: &str = "MARQUEE_STAGING_DIR";
/// Batch size limit variable.
pub const ENV_MAX_BATCH_FILES: &str = "MARQUEE_MAX_BATCH_FILES";
/// Request body limit variable.
pub const ENV_MAX_UPLOAD_BYTES: &str = "MARQUEE_MAX_UPLOAD_BYTES";
/// Batch response deadline variable.
pub const ENV_BATCH_TIMEOUT_SECS: &str = "MARQUEE_BATCH_TIMEOUT_SECS";
/// Overwrite toggle variable.
pub const ENV_OVERWRITE_EXISTING: &str = "MARQUEE_OVERWRITE_EXISTING";
/// Operator token variable.
pub const ENV_ADMIN_TOKEN: &str = "MARQUEE_ADMIN_TOKEN";
/// Fallback log level variable.
pub const ENV_LOG_LEVEL: &str = "MARQUEE_LOG_LEVEL";
/// Log format variable.
pub const ENV_LOG_FORMAT: &str = "MARQUEE_LOG_FORMAT";

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set to an invalid value.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup(ENV_BIND_ADDR)
            .map(|value| parse_ip(ENV_BIND_ADDR, &value))
            .transpose()?
            .unwrap_or(defaults::BIND_ADDR);
        let http_port = lookup(ENV_HTTP_PORT)
            .map(|value| parse_port(ENV_HTTP_PORT, &value))
            .transpose()?
            .unwrap_or(defaults::HTTP_PORT);
        let database_url = lookup(ENV_DATABASE_URL)
            .map(|value| non_empty(ENV_DATABASE_URL, &value))
            .transpose()?
            .unwrap_or_else(|| defaults::DATABASE_URL.to_string());
        let namespace_root = parse_dir(
            ENV_NAMESPACE_ROOT,
            &lookup(ENV_NAMESPACE_ROOT).unwrap_or_else(|| defaults::NAMESPACE_ROOT.to_string()),
        )?;
        let staging_dir = parse_dir(
            ENV_STAGING_DIR,
            &lookup(ENV_STAGING_DIR).unwrap_or_else(|| defaults::STAGING_DIR.to_string()),
        )?;

        let ingest = IngestPolicy {
            max_batch_files: lookup(ENV_MAX_BATCH_FILES)
                .map(|value| {
                    parse_bounded(ENV_MAX_BATCH_FILES, &value, 1, defaults::MAX_BATCH_FILES)
                })
                .transpose()?
                .unwrap_or(defaults::MAX_BATCH_FILES),
            max_upload_bytes: lookup(ENV_MAX_UPLOAD_BYTES)
                .map(|value| parse_bounded(ENV_MAX_UPLOAD_BYTES, &value, 1, usize::MAX))
                .transpose()?
                .unwrap_or(defaults::MAX_UPLOAD_BYTES),
            batch_timeout: lookup(ENV_BATCH_TIMEOUT_SECS)
                .filter(|value| !value.trim().is_empty())
                .map(|value| parse_secs(ENV_BATCH_TIMEOUT_SECS, &value))
                .transpose()?,
            overwrite_existing: lookup(ENV_OVERWRITE_EXISTING)
                .map(|value| parse_bool(ENV_OVERWRITE_EXISTING, &value))
                .transpose()?
                .unwrap_or(true),
        };

        let admin_token = lookup(ENV_ADMIN_TOKEN)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(AdminToken::new);

        let telemetry = TelemetryConfig {
            log_level: lookup(ENV_LOG_LEVEL)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| defaults::LOG_LEVEL.to_string()),
            log_format: lookup(ENV_LOG_FORMAT).map(|value| value.trim().to_ascii_lowercase()),
        };

        let config = Self {
            bind_addr,
            http_port,
            database_url,
            namespace_root,
            staging_dir,
            ingest,
            admin_token,
            telemetry,
        };
        debug!(
            addr = %config.socket_addr(),
            namespace_root = %config.namespace_root.display(),
            max_batch_files = config.ingest.max_batch_files,
            "server configuration loaded"
        );
        Ok(config)
    }
}
