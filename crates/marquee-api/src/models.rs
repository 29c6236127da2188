//! Request and response bodies of the HTTP API.

use serde::{Deserialize, Serialize};

/// RFC 9457 problem document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short summary of the problem class.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Occurrence-specific explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Body of `POST /admin/devices`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CreateDeviceRequest {
    /// Identifier the device will present.
    pub id: String,
    /// Operator-facing label.
    pub display_name: String,
}

/// Body of `PUT /admin/devices/{id}/active`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SetActiveRequest {
    /// Desired activation state.
    pub active: bool,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// `ok` or `unavailable`.
    pub database: String,
    /// Build revision of the running binary.
    pub build: String,
}
