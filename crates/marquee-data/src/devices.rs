//! Device registry: authorization records for display clients.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

const SELECT_DEVICE: &str =
    "SELECT id, display_name, active, registered_at FROM devices WHERE id = ?1";
const SELECT_DEVICES: &str =
    "SELECT id, display_name, active, registered_at FROM devices ORDER BY registered_at, id";
const INSERT_DEVICE: &str =
    "INSERT INTO devices (id, display_name, active, registered_at) VALUES (?1, ?2, ?3, ?4)";
const UPDATE_ACTIVE: &str = "UPDATE devices SET active = ?2 WHERE id = ?1 \
     RETURNING id, display_name, active, registered_at";
const TOGGLE_ACTIVE: &str = "UPDATE devices SET active = NOT active WHERE id = ?1 \
     RETURNING id, display_name, active, registered_at";
const DELETE_DEVICE: &str = "DELETE FROM devices WHERE id = ?1";

/// Registered display client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DeviceRecord {
    /// Opaque identifier supplied by the device on every fetch.
    pub id: String,
    /// Human-readable label shown to operators.
    pub display_name: String,
    /// Inactive devices are denied access but keep their record.
    pub active: bool,
    /// Registration instant.
    pub registered_at: DateTime<Utc>,
}

impl DeviceRecord {
    /// Build an active record registered now.
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            active: true,
            // Stored as text; second precision keeps lookups equal to inserts.
            registered_at: Utc::now().trunc_subsecs(0),
        }
    }
}

/// Lookup and lifecycle operations over registered devices.
///
/// Implementations must report outages as [`RegistryError::Unavailable`] so
/// callers can tell "not allowed" apart from "cannot decide".
#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    /// Fetch the record for `id`.
    async fn lookup(&self, id: &str) -> RegistryResult<DeviceRecord>;
    /// Set the active flag, returning the updated record.
    async fn set_active(&self, id: &str, active: bool) -> RegistryResult<DeviceRecord>;
    /// Flip the active flag, returning the updated record.
    async fn toggle(&self, id: &str) -> RegistryResult<DeviceRecord>;
    /// Register a new device.
    async fn insert(&self, record: &DeviceRecord) -> RegistryResult<()>;
    /// Remove a device.
    async fn delete(&self, id: &str) -> RegistryResult<()>;
    /// Every registered device in registration order.
    async fn list(&self) -> RegistryResult<Vec<DeviceRecord>>;
    /// Check the backing store is reachable.
    async fn ping(&self) -> RegistryResult<()>;
}

/// `SQLite` implementation of [`DeviceRegistry`].
#[derive(Clone)]
pub struct SqliteDeviceRegistry {
    pool: SqlitePool,
}

impl SqliteDeviceRegistry {
    /// Wrap an already-migrated pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn unavailable(operation: &'static str) -> impl FnOnce(sqlx::Error) -> RegistryError {
    move |source| RegistryError::Unavailable { operation, source }
}

fn validate_id(id: &str) -> RegistryResult<()> {
    if id.is_empty() || id.trim() != id {
        return Err(RegistryError::InvalidId { id: id.to_string() });
    }
    Ok(())
}

fn found(id: &str, row: Option<DeviceRecord>) -> RegistryResult<DeviceRecord> {
    row.ok_or_else(|| RegistryError::NotFound { id: id.to_string() })
}

#[async_trait]
impl DeviceRegistry for SqliteDeviceRegistry {
    async fn lookup(&self, id: &str) -> RegistryResult<DeviceRecord> {
        let row = sqlx::query_as::<_, DeviceRecord>(SELECT_DEVICE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable("devices.lookup"))?;
        found(id, row)
    }

    async fn set_active(&self, id: &str, active: bool) -> RegistryResult<DeviceRecord> {
        let row = sqlx::query_as::<_, DeviceRecord>(UPDATE_ACTIVE)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable("devices.set_active"))?;
        let record = found(id, row)?;
        debug!(device_id = %record.id, active = record.active, "device activation updated");
        Ok(record)
    }

    async fn toggle(&self, id: &str) -> RegistryResult<DeviceRecord> {
        let row = sqlx::query_as::<_, DeviceRecord>(TOGGLE_ACTIVE)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable("devices.toggle"))?;
        let record = found(id, row)?;
        debug!(device_id = %record.id, active = record.active, "device activation toggled");
        Ok(record)
    }

    async fn insert(&self, record: &DeviceRecord) -> RegistryResult<()> {
        validate_id(&record.id)?;
        let result = sqlx::query(INSERT_DEVICE)
            .bind(&record.id)
            .bind(&record.display_name)
            .bind(record.active)
            .bind(record.registered_at)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => {
                debug!(device_id = %record.id, "device registered");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(RegistryError::DuplicateId {
                    id: record.id.clone(),
                })
            }
            Err(source) => Err(RegistryError::Unavailable {
                operation: "devices.insert",
                source,
            }),
        }
    }

    async fn delete(&self, id: &str) -> RegistryResult<()> {
        let result = sqlx::query(DELETE_DEVICE)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unavailable("devices.delete"))?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound { id: id.to_string() });
        }
        debug!(device_id = %id, "device removed");
        Ok(())
    }

    async fn list(&self) -> RegistryResult<Vec<DeviceRecord>> {
        sqlx::query_as::<_, DeviceRecord>(SELECT_DEVICES)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable("devices.list"))
    }

    async fn ping(&self) -> RegistryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(unavailable("devices.ping"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_validation_rejects_blank_and_padded() {
        assert!(validate_id("DEV1").is_ok());
        assert!(matches!(
            validate_id(""),
            Err(RegistryError::InvalidId { .. })
        ));
        assert!(matches!(
            validate_id(" DEV1"),
            Err(RegistryError::InvalidId { .. })
        ));
    }

    #[test]
    fn new_records_start_active() {
        let record = DeviceRecord::new("DEV1", "Lobby");
        assert!(record.active);
        assert_eq!(record.registered_at.timestamp_subsec_nanos(), 0);
    }
}
