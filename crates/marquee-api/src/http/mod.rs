//! HTTP surface modules (router, middleware, handlers).

/// Operator token middleware.
pub mod admin;
/// Shared constants and header names.
pub mod constants;
/// Device administration handlers.
pub mod devices;
/// Protected file streaming.
pub mod downloads;
/// Problem response helpers and error types.
pub mod errors;
/// Display feed handlers.
pub mod feed;
/// Device authorization gateway.
pub mod gateway;
/// Health and metrics endpoints.
pub mod health;
/// Batch upload, listing, and cleanup handlers.
pub mod ingest;
/// Router construction and server host.
pub mod router;
/// Request counting middleware.
pub mod telemetry;
