//! Default values applied when an environment variable is absent.
//!
//! # Design
//! - Keep defaults aligned with the historical deployment layout
//!   (`downloads/` served to devices, port 3001).

use std::net::{IpAddr, Ipv4Addr};

/// Default listen address.
pub const BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
/// Default listen port.
pub const HTTP_PORT: u16 = 3001;
/// Default registry/feed database location.
pub const DATABASE_URL: &str = "sqlite://marquee.db?mode=rwc";
/// Default permanent ingestion namespace.
pub const NAMESPACE_ROOT: &str = "downloads";
/// Default staging directory for in-flight uploads.
pub const STAGING_DIR: &str = "uploads/tmp";
/// Hard upper bound on files per upload batch.
pub const MAX_BATCH_FILES: usize = 12;
/// Default request body limit for batch uploads (256 MiB).
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;
/// Default fallback log level.
pub const LOG_LEVEL: &str = "info";
