//! Error types for the data access layer.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result alias for data layer operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors raised while opening the database or reading feeds.
#[derive(Debug)]
pub enum DataError {
    /// Connecting to the database failed.
    ConnectFailed {
        /// Underlying SQL error.
        source: sqlx::Error,
    },
    /// Migration execution failed.
    MigrationFailed {
        /// Underlying migration error.
        source: sqlx::migrate::MigrateError,
    },
    /// A database operation failed.
    QueryFailed {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying SQL error.
        source: sqlx::Error,
    },
}

impl Display for DataError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed { .. } => formatter.write_str("database connection failed"),
            Self::MigrationFailed { .. } => formatter.write_str("migration failed"),
            Self::QueryFailed { .. } => formatter.write_str("database operation failed"),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConnectFailed { source } | Self::QueryFailed { source, .. } => Some(source),
            Self::MigrationFailed { source } => Some(source),
        }
    }
}

/// Result alias for device registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// Errors surfaced by the device registry contract.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No record exists for the identifier.
    #[error("device not found")]
    NotFound {
        /// Identifier that was looked up.
        id: String,
    },
    /// A record with the identifier already exists.
    #[error("device identifier already registered")]
    DuplicateId {
        /// Identifier that collided.
        id: String,
    },
    /// The identifier is empty or carries surrounding whitespace.
    #[error("device identifier invalid")]
    InvalidId {
        /// Offending identifier.
        id: String,
    },
    /// The backing store could not be reached or failed the query.
    #[error("device registry unavailable")]
    Unavailable {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying SQL error.
        #[source]
        source: sqlx::Error,
    },
}

impl RegistryError {
    /// Whether the failure reflects an outage rather than a registry decision.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_error_display_and_source() {
        let migration = DataError::MigrationFailed {
            source: sqlx::migrate::MigrateError::VersionMissing(1),
        };
        assert_eq!(migration.to_string(), "migration failed");
        assert!(migration.source().is_some());

        let query = DataError::QueryFailed {
            operation: "fetch",
            source: sqlx::Error::RowNotFound,
        };
        assert_eq!(query.to_string(), "database operation failed");
        assert!(query.source().is_some());

        let connect = DataError::ConnectFailed {
            source: sqlx::Error::PoolClosed,
        };
        assert_eq!(connect.to_string(), "database connection failed");
        assert!(connect.source().is_some());
    }

    #[test]
    fn registry_error_classifies_outages() {
        let outage = RegistryError::Unavailable {
            operation: "devices.lookup",
            source: sqlx::Error::PoolTimedOut,
        };
        assert!(outage.is_unavailable());
        assert!(outage.source().is_some());

        let missing = RegistryError::NotFound {
            id: "DEV1".to_string(),
        };
        assert!(!missing.is_unavailable());
        assert_eq!(missing.to_string(), "device not found");
    }
}
