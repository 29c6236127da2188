//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes counters for the gateway, the ingestion barrier, and cleanup.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Outcome of a single device authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The device was found and active.
    Granted,
    /// No identifier was supplied.
    Unauthenticated,
    /// The identifier was unknown or inactive, or the path was rejected.
    Forbidden,
    /// The registry could not be consulted.
    BackendUnavailable,
}

impl AccessDecision {
    /// Label value recorded for the decision.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::BackendUnavailable => "backend_unavailable",
        }
    }
}

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    device_access_total: IntCounterVec,
    ingest_batches_total: IntCounterVec,
    ingest_items_total: IntCounterVec,
    cleanup_files_deleted_total: IntCounter,
    cleanup_failures_total: IntCounter,
}

/// Snapshot of selected counters for health reporting and tests.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Protected fetches that passed the gateway.
    pub access_granted_total: u64,
    /// Protected fetches rejected by the gateway (any reason except backend outage).
    pub access_denied_total: u64,
    /// Protected fetches that failed because the registry was unreachable.
    pub access_backend_unavailable_total: u64,
    /// Ingestion items that were relocated successfully.
    pub ingest_items_moved_total: u64,
    /// Files deleted by cleanup runs.
    pub cleanup_files_deleted_total: u64,
    /// Individual deletions that failed during cleanup runs.
    pub cleanup_failures_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            "http_requests_total",
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let device_access_total = counter_vec(
            "device_access_total",
            "Protected fetch authorization decisions",
            &["decision"],
        )?;
        let ingest_batches_total = counter_vec(
            "ingest_batches_total",
            "Upload batches settled by status",
            &["status"],
        )?;
        let ingest_items_total = counter_vec(
            "ingest_items_total",
            "Upload items relocated by outcome",
            &["outcome"],
        )?;
        let cleanup_files_deleted_total = counter(
            "cleanup_files_deleted_total",
            "Files removed from the ingestion namespace by cleanup",
        )?;
        let cleanup_failures_total = counter(
            "cleanup_failures_total",
            "Deletions that failed during cleanup",
        )?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "device_access_total", &device_access_total)?;
        register(&registry, "ingest_batches_total", &ingest_batches_total)?;
        register(&registry, "ingest_items_total", &ingest_items_total)?;
        register(
            &registry,
            "cleanup_files_deleted_total",
            &cleanup_files_deleted_total,
        )?;
        register(&registry, "cleanup_failures_total", &cleanup_failures_total)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                device_access_total,
                ingest_batches_total,
                ingest_items_total,
                cleanup_files_deleted_total,
                cleanup_failures_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        let code = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[route, code.as_str()])
            .inc();
    }

    /// Record a gateway authorization decision.
    pub fn inc_device_access(&self, decision: AccessDecision) {
        self.inner
            .device_access_total
            .with_label_values(&[decision.as_str()])
            .inc();
    }

    /// Record a settled upload batch (`settled`, `partial`, or `timed_out`).
    pub fn inc_ingest_batch(&self, status: &str) {
        self.inner
            .ingest_batches_total
            .with_label_values(&[status])
            .inc();
    }

    /// Record the outcome of a single relocation.
    pub fn inc_ingest_item(&self, outcome: &str) {
        self.inner
            .ingest_items_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record the result of a cleanup run.
    pub fn record_cleanup(&self, deleted: usize, failed: usize) {
        self.inner
            .cleanup_files_deleted_total
            .inc_by(u64::try_from(deleted).unwrap_or(u64::MAX));
        self.inner
            .cleanup_failures_total
            .inc_by(u64::try_from(failed).unwrap_or(u64::MAX));
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Exposition { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::ExpositionEncoding { source })
    }

    /// Take a point-in-time snapshot of the most relevant counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let access = |decision: AccessDecision| {
            self.inner
                .device_access_total
                .with_label_values(&[decision.as_str()])
                .get()
        };
        MetricsSnapshot {
            access_granted_total: access(AccessDecision::Granted),
            access_denied_total: access(AccessDecision::Unauthenticated)
                + access(AccessDecision::Forbidden),
            access_backend_unavailable_total: access(AccessDecision::BackendUnavailable),
            ingest_items_moved_total: self
                .inner
                .ingest_items_total
                .with_label_values(&["moved"])
                .get(),
            cleanup_files_deleted_total: self.inner.cleanup_files_deleted_total.get(),
            cleanup_failures_total: self.inner.cleanup_failures_total.get(),
        }
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels).map_err(|source| {
        TelemetryError::Collector {
            operation: "collector.build",
            name,
            source,
        }
    })
}

fn counter(name: &'static str, help: &str) -> Result<IntCounter> {
    IntCounter::with_opts(Opts::new(name, help)).map_err(|source| TelemetryError::Collector {
        operation: "collector.build",
        name,
        source,
    })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::Collector {
            operation: "collector.register",
            name,
            source,
        })
}
