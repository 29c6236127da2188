//! Shared application state threaded through every handler.

use std::path::PathBuf;
use std::sync::Arc;

use marquee_config::{AdminToken, IngestPolicy};
use marquee_data::{DeviceRegistry, FeedStore};
use marquee_fsops::{BatchCleanup, IngestionBarrier, StagingArea};
use marquee_telemetry::Metrics;

pub(crate) struct ApiState {
    pub(crate) registry: Arc<dyn DeviceRegistry>,
    pub(crate) feed: FeedStore,
    pub(crate) namespace_root: PathBuf,
    pub(crate) staging: StagingArea,
    pub(crate) barrier: IngestionBarrier,
    pub(crate) cleanup: BatchCleanup,
    pub(crate) policy: IngestPolicy,
    pub(crate) admin_token: Option<AdminToken>,
    pub(crate) telemetry: Metrics,
}
