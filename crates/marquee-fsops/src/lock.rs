//! Namespace-scoped reader/writer lock serialising cleanup against batches.

use std::sync::Arc;

use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Shared lock for one ingestion namespace.
///
/// Batches take the shared side from dispatch until they finalize; cleanup
/// takes the exclusive side, so it waits for every in-flight batch.
#[derive(Clone, Debug, Default)]
pub struct NamespaceLock {
    inner: Arc<RwLock<()>>,
}

impl NamespaceLock {
    /// Create an unlocked namespace lock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the shared side for a batch.
    pub async fn shared(&self) -> OwnedRwLockReadGuard<()> {
        Arc::clone(&self.inner).read_owned().await
    }

    /// Acquire the exclusive side for cleanup.
    pub async fn exclusive(&self) -> OwnedRwLockWriteGuard<()> {
        Arc::clone(&self.inner).write_owned().await
    }
}
