//! Best-effort purge of the ingestion namespace.

use std::io;
use std::path::{Path, PathBuf};

use marquee_telemetry::Metrics;
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{FsOpsError, FsOpsResult};
use crate::lock::NamespaceLock;

/// An entry that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    /// Entry name relative to the namespace root.
    pub name: String,
    /// Rendered IO error.
    pub error: String,
}

/// Result of one purge run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Entries removed.
    pub deleted: usize,
    /// Entries that could not be removed.
    pub failures: Vec<CleanupFailure>,
}

/// Delete every entry directly under `root`, continuing past failures.
///
/// An empty namespace yields zero deletions.
///
/// # Errors
///
/// - [`FsOpsError::Io`] if the namespace cannot be listed.
/// - [`FsOpsError::CleanupIncomplete`] carrying the full report when any
///   deletion failed.
pub async fn purge_all(root: &Path) -> FsOpsResult<CleanupReport> {
    purge_with(root, |path| async move { remove_entry(&path).await }).await
}

async fn purge_with<F, Fut>(root: &Path, mut remove: F) -> FsOpsResult<CleanupReport>
where
    F: FnMut(PathBuf) -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let mut entries = fs::read_dir(root)
        .await
        .map_err(|source| FsOpsError::io("cleanup.read_dir", root, source))?;
    let mut report = CleanupReport::default();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(source) => return Err(FsOpsError::io("cleanup.next_entry", root, source)),
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        match remove(path.clone()).await {
            Ok(()) => report.deleted += 1,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cleanup could not remove entry");
                report.failures.push(CleanupFailure {
                    name,
                    error: err.to_string(),
                });
            }
        }
    }
    if report.failures.is_empty() {
        Ok(report)
    } else {
        Err(FsOpsError::CleanupIncomplete { report })
    }
}

async fn remove_entry(path: &Path) -> io::Result<()> {
    let file_type = fs::symlink_metadata(path).await?.file_type();
    if file_type.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    }
}

/// Cleanup bound to one namespace; waits for in-flight batches.
#[derive(Clone)]
pub struct BatchCleanup {
    root: PathBuf,
    lock: NamespaceLock,
    metrics: Metrics,
}

impl BatchCleanup {
    /// Cleanup over `root`, serialised through `lock`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, lock: NamespaceLock, metrics: Metrics) -> Self {
        Self {
            root: root.into(),
            lock,
            metrics,
        }
    }

    /// Take the namespace exclusively and purge it.
    ///
    /// # Errors
    ///
    /// See [`purge_all`].
    pub async fn purge(&self) -> FsOpsResult<CleanupReport> {
        let _exclusive = self.lock.exclusive().await;
        let result = purge_all(&self.root).await;
        match &result {
            Ok(report) => {
                self.metrics.record_cleanup(report.deleted, 0);
                info!(deleted = report.deleted, "namespace purged");
            }
            Err(FsOpsError::CleanupIncomplete { report }) => {
                self.metrics
                    .record_cleanup(report.deleted, report.failures.len());
                warn!(
                    deleted = report.deleted,
                    failed = report.failures.len(),
                    "namespace purge incomplete"
                );
            }
            Err(err) => warn!(error = %err, "namespace purge failed"),
        }
        result
    }
}
