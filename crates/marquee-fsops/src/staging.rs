//! Temporary storage for uploads before relocation.
//!
//! Staged files are owned through [`TempPath`]: dropping the path removes the
//! file, so an upload that is abandoned at any await point (client disconnect,
//! rejected batch, failed relocation) never outlives its owner.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use tokio::fs::File;

use crate::error::{FsOpsError, FsOpsResult};

const STAGED_PREFIX: &str = "upload-";

/// Directory holding uploads until their batch is dispatched.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Stage uploads under `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Staging directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a uniquely named empty file for one upload.
    ///
    /// The file is deleted when the returned [`TempPath`] drops; a relocated
    /// file is already gone by then.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Io`] if the file cannot be created.
    pub async fn create(&self) -> FsOpsResult<(TempPath, File)> {
        let dir = self.dir.clone();
        let staged = tokio::task::spawn_blocking(move || {
            Builder::new().prefix(STAGED_PREFIX).tempfile_in(dir)
        })
        .await
        .map_err(io::Error::other)
        .and_then(std::convert::identity)
        .map_err(|source| FsOpsError::io("staging.create", &self.dir, source))?;
        let (file, path) = staged.into_parts();
        Ok((path, File::from_std(file)))
    }
}
