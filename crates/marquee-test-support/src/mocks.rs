//! Device registry doubles.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use marquee_data::{DeviceRecord, DeviceRegistry, RegistryError, RegistryResult};

/// Registry that must never be consulted; any call panics the test.
#[derive(Debug, Default)]
pub struct UntouchableRegistry {
    calls: AtomicUsize,
}

impl UntouchableRegistry {
    /// Number of calls attempted.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touched(&self, operation: &str) -> ! {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("registry queried unexpectedly: {operation}");
    }
}

#[async_trait]
impl DeviceRegistry for UntouchableRegistry {
    async fn lookup(&self, _id: &str) -> RegistryResult<DeviceRecord> {
        self.touched("lookup")
    }

    async fn set_active(&self, _id: &str, _active: bool) -> RegistryResult<DeviceRecord> {
        self.touched("set_active")
    }

    async fn toggle(&self, _id: &str) -> RegistryResult<DeviceRecord> {
        self.touched("toggle")
    }

    async fn insert(&self, _record: &DeviceRecord) -> RegistryResult<()> {
        self.touched("insert")
    }

    async fn delete(&self, _id: &str) -> RegistryResult<()> {
        self.touched("delete")
    }

    async fn list(&self) -> RegistryResult<Vec<DeviceRecord>> {
        self.touched("list")
    }

    async fn ping(&self) -> RegistryResult<()> {
        self.touched("ping")
    }
}

/// Registry whose backing store is always unreachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRegistry;

fn offline<T>(operation: &'static str) -> RegistryResult<T> {
    Err(RegistryError::Unavailable {
        operation,
        source: sqlx::Error::PoolTimedOut,
    })
}

#[async_trait]
impl DeviceRegistry for OfflineRegistry {
    async fn lookup(&self, _id: &str) -> RegistryResult<DeviceRecord> {
        offline("devices.lookup")
    }

    async fn set_active(&self, _id: &str, _active: bool) -> RegistryResult<DeviceRecord> {
        offline("devices.set_active")
    }

    async fn toggle(&self, _id: &str) -> RegistryResult<DeviceRecord> {
        offline("devices.toggle")
    }

    async fn insert(&self, _record: &DeviceRecord) -> RegistryResult<()> {
        offline("devices.insert")
    }

    async fn delete(&self, _id: &str) -> RegistryResult<()> {
        offline("devices.delete")
    }

    async fn list(&self) -> RegistryResult<Vec<DeviceRecord>> {
        offline("devices.list")
    }

    async fn ping(&self) -> RegistryResult<()> {
        offline("devices.ping")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_registry_reports_unavailable() {
        let registry = OfflineRegistry;
        let err = registry.lookup("DEV1").await.expect_err("offline");
        assert!(err.is_unavailable());
        assert!(registry.ping().await.is_err());
    }

    #[tokio::test]
    async fn untouchable_registry_counts_before_panicking() {
        let registry = std::sync::Arc::new(UntouchableRegistry::default());
        let handle = std::sync::Arc::clone(&registry);
        let outcome = tokio::spawn(async move { handle.lookup("DEV1").await }).await;
        assert!(outcome.is_err());
        assert_eq!(registry.calls(), 1);
    }
}
