//! Bulk ingestion barrier.
//!
//! # Design
//! - One relocation task per upload item; tasks share nothing but the batch
//!   tracker.
//! - Every item reports exactly once. A drop guard reports tasks that panic or
//!   are cancelled, so the count always reaches the batch size.
//! - The report that completes the count builds the outcome, releases the
//!   namespace lease and notifies the caller inside the same critical section.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use marquee_telemetry::Metrics;
use serde::Serialize;
use tempfile::TempPath;
use tokio::sync::{OwnedRwLockReadGuard, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{FsOpsError, FsOpsResult};
use crate::lock::NamespaceLock;
use crate::relocate::{FsRelocator, Relocator};

const MAX_NAME_BYTES: usize = 255;

/// A staged upload waiting to be relocated.
///
/// Dropping the item deletes whatever is still at the staged location.
#[derive(Debug)]
pub struct UploadItem {
    /// Where the upload was staged.
    pub temp_location: TempPath,
    /// File name supplied by the client; becomes the name in the namespace.
    pub original_name: String,
    /// Staged size in bytes.
    pub size: u64,
}

/// Items from one multipart submission.
#[derive(Debug)]
pub struct IngestionBatch {
    /// Identifier carried through logs and the outcome.
    pub id: Uuid,
    /// Items in submission order.
    pub items: Vec<UploadItem>,
}

impl IngestionBatch {
    /// Wrap `items` under a fresh batch identifier.
    #[must_use]
    pub fn new(items: Vec<UploadItem>) -> Self {
        Self {
            id: Uuid::new_v4(),
            items,
        }
    }
}

/// Why an item failed to land in the namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Filesystem failure while moving the file.
    #[serde(rename = "IOError")]
    IoError,
    /// The name is already taken.
    AlreadyExists,
    /// The name cannot be used as a file name inside the namespace.
    NameInvalid,
}

impl ErrorKind {
    /// Metrics label for the failure.
    #[must_use]
    pub const fn as_label(self) -> &'static str {
        match self {
            Self::IoError => "io_error",
            Self::AlreadyExists => "already_exists",
            Self::NameInvalid => "name_invalid",
        }
    }
}

/// A failed item in a settled batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Position of the item in the submitted batch.
    #[serde(skip)]
    pub index: usize,
    /// Name the client supplied.
    pub original_name: String,
    /// Failure classification.
    pub error_kind: ErrorKind,
}

/// Terminal result of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Batch identifier.
    pub batch_id: Uuid,
    /// Number of submitted items.
    pub total: usize,
    /// Items moved into the namespace.
    pub succeeded: usize,
    /// Failed items ordered by batch position.
    pub failures: Vec<ItemFailure>,
}

impl BatchOutcome {
    /// Whether every item landed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Check that `name` is a single plain file name.
///
/// # Errors
///
/// Returns [`ErrorKind::NameInvalid`] for empty, oversized, dotted, or
/// path-like names and names carrying control characters.
pub fn validate_name(name: &str) -> Result<(), ErrorKind> {
    if name.is_empty()
        || name.len() > MAX_NAME_BYTES
        || name.chars().any(|ch| ch.is_control() || ch == '/' || ch == '\\')
    {
        return Err(ErrorKind::NameInvalid);
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ErrorKind::NameInvalid),
    }
}

struct TrackerState {
    reported: usize,
    succeeded: usize,
    failures: Vec<ItemFailure>,
    notify: Option<oneshot::Sender<BatchOutcome>>,
    lease: Option<OwnedRwLockReadGuard<()>>,
}

struct BatchTracker {
    batch_id: Uuid,
    total: usize,
    metrics: Metrics,
    state: Mutex<TrackerState>,
}

impl BatchTracker {
    fn new(
        batch_id: Uuid,
        total: usize,
        metrics: Metrics,
        notify: oneshot::Sender<BatchOutcome>,
        lease: OwnedRwLockReadGuard<()>,
    ) -> Self {
        Self {
            batch_id,
            total,
            metrics,
            state: Mutex::new(TrackerState {
                reported: 0,
                succeeded: 0,
                failures: Vec::new(),
                notify: Some(notify),
                lease: Some(lease),
            }),
        }
    }

    fn report(&self, index: usize, original_name: String, result: Result<(), ErrorKind>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.reported >= self.total {
            warn!(batch_id = %self.batch_id, index, "ignoring report for a settled batch");
            return;
        }
        state.reported += 1;
        match result {
            Ok(()) => {
                state.succeeded += 1;
                self.metrics.inc_ingest_item("moved");
            }
            Err(error_kind) => {
                self.metrics.inc_ingest_item(error_kind.as_label());
                state.failures.push(ItemFailure {
                    index,
                    original_name,
                    error_kind,
                });
            }
        }
        if state.reported == self.total {
            self.finalize(&mut state);
        }
    }

    fn finalize(&self, state: &mut TrackerState) {
        let mut failures = std::mem::take(&mut state.failures);
        failures.sort_by_key(|failure| failure.index);
        let outcome = BatchOutcome {
            batch_id: self.batch_id,
            total: self.total,
            succeeded: state.succeeded,
            failures,
        };
        let status = if outcome.is_success() {
            "settled"
        } else {
            "partial"
        };
        self.metrics.inc_ingest_batch(status);
        info!(
            batch_id = %self.batch_id,
            total = outcome.total,
            succeeded = outcome.succeeded,
            failed = outcome.failures.len(),
            "ingestion batch settled"
        );
        drop(state.lease.take());
        if let Some(notify) = state.notify.take()
            && notify.send(outcome).is_err()
        {
            warn!(batch_id = %self.batch_id, "batch settled after its caller stopped waiting");
        }
    }
}

/// Reports exactly once per item, even if the owning task never completes.
struct PendingReport {
    tracker: Arc<BatchTracker>,
    index: usize,
    original_name: Option<String>,
}

impl PendingReport {
    fn new(tracker: Arc<BatchTracker>, index: usize, original_name: String) -> Self {
        Self {
            tracker,
            index,
            original_name: Some(original_name),
        }
    }

    fn complete(mut self, result: Result<(), ErrorKind>) {
        if let Some(name) = self.original_name.take() {
            self.tracker.report(self.index, name, result);
        }
    }
}

impl Drop for PendingReport {
    fn drop(&mut self) {
        if let Some(name) = self.original_name.take() {
            warn!(
                batch_id = %self.tracker.batch_id,
                original_name = %name,
                "relocation ended without reporting"
            );
            self.tracker.report(self.index, name, Err(ErrorKind::IoError));
        }
    }
}

/// Handle to a dispatched batch.
#[derive(Debug)]
pub struct BatchHandle {
    batch_id: Uuid,
    receiver: oneshot::Receiver<BatchOutcome>,
}

impl BatchHandle {
    /// Identifier of the dispatched batch.
    #[must_use]
    pub const fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Wait for every item to report.
    ///
    /// Dropping the returned future (for example on timeout) does not cancel
    /// the relocations; the batch still settles and logs its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::BatchAbandoned`] if the tracker vanished without
    /// settling.
    pub async fn settled(self) -> FsOpsResult<BatchOutcome> {
        let batch_id = self.batch_id;
        self.receiver
            .await
            .map_err(|_| FsOpsError::BatchAbandoned { batch_id })
    }
}

/// Fan-out/fan-in coordinator relocating batches into one namespace.
#[derive(Clone)]
pub struct IngestionBarrier {
    root: PathBuf,
    lock: NamespaceLock,
    relocator: Arc<dyn Relocator>,
    metrics: Metrics,
    overwrite_existing: bool,
}

impl IngestionBarrier {
    /// Barrier over `root` using filesystem renames and replacing existing files.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, lock: NamespaceLock, metrics: Metrics) -> Self {
        Self {
            root: root.into(),
            lock,
            relocator: Arc::new(FsRelocator),
            metrics,
            overwrite_existing: true,
        }
    }

    /// Replace the relocation strategy.
    #[must_use]
    pub fn with_relocator(mut self, relocator: Arc<dyn Relocator>) -> Self {
        self.relocator = relocator;
        self
    }

    /// Choose whether existing namespace files are replaced.
    #[must_use]
    pub const fn with_overwrite(mut self, overwrite_existing: bool) -> Self {
        self.overwrite_existing = overwrite_existing;
        self
    }

    /// Namespace root the barrier writes into.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Take the namespace lease and start one relocation per item.
    pub async fn dispatch(&self, batch: IngestionBatch) -> BatchHandle {
        let lease = self.lock.shared().await;
        let (notify, receiver) = oneshot::channel();
        let total = batch.items.len();
        let tracker = Arc::new(BatchTracker::new(
            batch.id,
            total,
            self.metrics.clone(),
            notify,
            lease,
        ));
        debug!(batch_id = %batch.id, total, "dispatching ingestion batch");

        if total == 0 {
            tracker.finalize(&mut tracker.state.lock().unwrap_or_else(PoisonError::into_inner));
        }

        let mut seen = HashSet::with_capacity(total);
        for (index, item) in batch.items.into_iter().enumerate() {
            let pending = PendingReport::new(Arc::clone(&tracker), index, item.original_name.clone());
            let rejected = if validate_name(&item.original_name).is_err() {
                Some(ErrorKind::NameInvalid)
            } else if !seen.insert(item.original_name.clone()) {
                Some(ErrorKind::AlreadyExists)
            } else {
                None
            };
            if let Some(error_kind) = rejected {
                warn!(
                    batch_id = %batch.id,
                    original_name = %item.original_name,
                    error_kind = error_kind.as_label(),
                    "upload item rejected"
                );
                drop(item.temp_location);
                pending.complete(Err(error_kind));
                continue;
            }

            let destination = self.root.join(&item.original_name);
            let relocator = Arc::clone(&self.relocator);
            let overwrite = self.overwrite_existing;
            let batch_id = batch.id;
            tokio::spawn(async move {
                let result = relocator
                    .relocate(&item.temp_location, &destination, overwrite)
                    .await;
                // Staging is cleared before the item counts toward the outcome.
                drop(item.temp_location);
                match result {
                    Ok(()) => {
                        debug!(
                            %batch_id,
                            original_name = %item.original_name,
                            size = item.size,
                            "upload item relocated"
                        );
                        pending.complete(Ok(()));
                    }
                    Err(err) => {
                        warn!(
                            %batch_id,
                            original_name = %item.original_name,
                            error = %err,
                            "upload item relocation failed"
                        );
                        pending.complete(Err(err.kind()));
                    }
                }
            });
        }

        BatchHandle {
            batch_id: batch.id,
            receiver,
        }
    }

    /// Dispatch `batch` and wait for it to settle.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::BatchAbandoned`] if the batch never settles.
    pub async fn run(&self, batch: IngestionBatch) -> FsOpsResult<BatchOutcome> {
        self.dispatch(batch).await.settled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_must_be_single_plain_components() {
        for valid in ["page.html", "menu 2.png", ".hidden", "ünïcode.txt"] {
            assert_eq!(validate_name(valid), Ok(()), "{valid}");
        }
        let long = "a".repeat(MAX_NAME_BYTES + 1);
        for invalid in [
            "",
            ".",
            "..",
            "dir/page.html",
            "..\\page.html",
            "/etc/passwd",
            "tab\tname",
            long.as_str(),
        ] {
            assert_eq!(validate_name(invalid), Err(ErrorKind::NameInvalid), "{invalid}");
        }
    }

    #[test]
    fn error_kinds_serialise_with_public_names() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&ErrorKind::IoError)?, "\"IOError\"");
        assert_eq!(
            serde_json::to_string(&ErrorKind::AlreadyExists)?,
            "\"AlreadyExists\""
        );
        assert_eq!(ErrorKind::NameInvalid.as_label(), "name_invalid");
        Ok(())
    }

    #[tokio::test]
    async fn empty_batch_settles_immediately() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let barrier = IngestionBarrier::new(temp.path(), NamespaceLock::new(), Metrics::new()?);
        let outcome = barrier.run(IngestionBatch::new(Vec::new())).await?;
        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.succeeded, 0);
        assert!(outcome.is_success());
        Ok(())
    }
}
