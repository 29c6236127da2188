//! # Design
//!
//! - Constant-message errors for namespace access, ingestion and cleanup.
//! - Context lives in fields; sources are preserved, never interpolated.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cleanup::CleanupReport;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by namespace operations.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The requested path escapes the namespace root.
    #[error("path escapes namespace")]
    PathTraversal {
        /// Path as requested by the caller.
        requested: String,
    },
    /// The requested resource does not exist or is not a regular file.
    #[error("resource not found")]
    NotFound {
        /// Path as requested by the caller.
        requested: String,
    },
    /// Some deletions failed during cleanup; the rest were attempted.
    #[error("cleanup incomplete")]
    CleanupIncomplete {
        /// What was deleted and what failed.
        report: CleanupReport,
    },
    /// The barrier was dropped before the batch finalized.
    #[error("batch abandoned before settling")]
    BatchAbandoned {
        /// Identifier of the abandoned batch.
        batch_id: uuid::Uuid,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
