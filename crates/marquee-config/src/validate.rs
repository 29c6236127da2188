//! Parsing helpers for individual configuration fields.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

pub(crate) fn parse_ip(field: &'static str, value: &str) -> ConfigResult<IpAddr> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, "invalid_ip", value))
}

pub(crate) fn parse_port(field: &'static str, value: &str) -> ConfigResult<u16> {
    let port: u16 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, "out_of_range", value))?;
    if port == 0 {
        return Err(ConfigError::invalid(field, "zero", value));
    }
    Ok(port)
}

pub(crate) fn parse_bool(field: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(field, "invalid_bool", value)),
    }
}

pub(crate) fn parse_bounded(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> ConfigResult<usize> {
    let parsed: usize = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, "not_a_number", value))?;
    if parsed < min || parsed > max {
        return Err(ConfigError::invalid(field, "out_of_range", value));
    }
    Ok(parsed)
}

pub(crate) fn parse_secs(field: &'static str, value: &str) -> ConfigResult<Duration> {
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(field, "not_a_number", value))?;
    if secs == 0 {
        return Err(ConfigError::invalid(field, "zero", value));
    }
    Ok(Duration::from_secs(secs))
}

pub(crate) fn parse_dir(field: &'static str, value: &str) -> ConfigResult<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(field, "empty", value));
    }
    Ok(PathBuf::from(trimmed))
}

pub(crate) fn non_empty(field: &'static str, value: &str) -> ConfigResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(field, "empty", value));
    }
    Ok(trimmed.to_string())
}
