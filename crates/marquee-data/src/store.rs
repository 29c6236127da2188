//! Connection management and migrations.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::devices::SqliteDeviceRegistry;
use crate::error::{DataError, Result};
use crate::feed::FeedStore;

/// Handle to the migrated SQLite database backing the registry and feeds.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating when missing) the database at `url` and apply migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is invalid, the database is
    /// unreachable, or migrations fail.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|source| DataError::ConnectFailed { source })?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(|source| DataError::ConnectFailed { source })?;
        let database = Self::migrate(pool).await?;
        info!(url, "database ready");
        Ok(database)
    }

    /// Open a private in-memory database; every handle clone shares the single connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or migrations fail.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|source| DataError::ConnectFailed { source })?;
        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|source| DataError::MigrationFailed { source })?;
        Ok(Self { pool })
    }

    /// Access the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Device registry backed by this database.
    #[must_use]
    pub fn devices(&self) -> SqliteDeviceRegistry {
        SqliteDeviceRegistry::new(self.pool.clone())
    }

    /// Read-only feed queries backed by this database.
    #[must_use]
    pub fn feed(&self) -> FeedStore {
        FeedStore::new(self.pool.clone())
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
