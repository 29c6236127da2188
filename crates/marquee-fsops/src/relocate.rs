//! Moving staged uploads into the namespace.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ingest::ErrorKind;

/// Failure of a single relocation.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// The destination exists and overwriting is disabled.
    #[error("destination already exists")]
    AlreadyExists {
        /// Destination that was occupied.
        path: PathBuf,
    },
    /// IO failure while moving the file.
    #[error("relocation io failure")]
    Io {
        /// Step that failed.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A fallback copy did not produce the expected number of bytes.
    #[error("relocation copy incomplete")]
    LengthMismatch {
        /// Destination of the copy.
        path: PathBuf,
        /// Size of the staged source.
        expected: u64,
        /// Bytes actually written.
        actual: u64,
    },
}

impl RelocateError {
    /// Per-item error kind reported in the batch outcome.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Io { .. } | Self::LengthMismatch { .. } => ErrorKind::IoError,
        }
    }

    fn io(operation: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Strategy used by the ingestion barrier to move one staged file.
#[async_trait]
pub trait Relocator: Send + Sync {
    /// Move `source` to `destination`.
    async fn relocate(
        &self,
        source: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> Result<(), RelocateError>;
}

/// Rename-first relocator with a copy, verify, delete fallback when the
/// staging area and namespace live on different filesystems.
///
/// Without overwrite the name is claimed with a hard link, which fails rather
/// than replacing a file that appeared after the batch started.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsRelocator;

fn needs_copy(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::CrossesDevices | io::ErrorKind::Unsupported
    )
}

/// Hidden sibling of `destination` that receives a fallback copy.
fn partial_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{name}.{}.partial", Uuid::new_v4().simple()))
}

async fn remove_quietly(path: &Path, what: &'static str) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), error = %err, "failed to remove {what}"),
    }
}

impl FsRelocator {
    /// Link `source` at `destination`, refusing an occupied name.
    async fn claim(source: &Path, destination: &Path) -> io::Result<()> {
        fs::hard_link(source, destination).await
    }

    async fn copy_into(source: &Path, partial: &Path) -> Result<u64, RelocateError> {
        let mut reader = fs::File::open(source)
            .await
            .map_err(|err| RelocateError::io("relocate.open_source", source, err))?;
        let mut writer = fs::File::create_new(partial)
            .await
            .map_err(|err| RelocateError::io("relocate.create_partial", partial, err))?;
        let copied = tokio::io::copy(&mut reader, &mut writer)
            .await
            .map_err(|err| RelocateError::io("relocate.copy", partial, err))?;
        writer
            .sync_all()
            .await
            .map_err(|err| RelocateError::io("relocate.sync", partial, err))?;
        Ok(copied)
    }

    /// Copy beside `destination`, verify the length, then publish the copy
    /// under its final name. Readers never see a partially written file.
    async fn copy_verify_remove(
        source: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> Result<(), RelocateError> {
        let expected = fs::metadata(source)
            .await
            .map_err(|err| RelocateError::io("relocate.stat_source", source, err))?
            .len();
        let partial = partial_path(destination);
        let published = match Self::copy_into(source, &partial).await {
            Ok(actual) if actual != expected => Err(RelocateError::LengthMismatch {
                path: destination.to_path_buf(),
                expected,
                actual,
            }),
            Ok(_) if overwrite => fs::rename(&partial, destination)
                .await
                .map_err(|err| RelocateError::io("relocate.publish", destination, err)),
            Ok(_) => match Self::claim(&partial, destination).await {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    Err(RelocateError::AlreadyExists {
                        path: destination.to_path_buf(),
                    })
                }
                Err(err) => Err(RelocateError::io("relocate.publish", destination, err)),
            },
            Err(err) => Err(err),
        };
        remove_quietly(&partial, "partial copy").await;
        published?;
        // Verified and published; a leftover staged file does not fail the item.
        remove_quietly(source, "staged source after copy").await;
        Ok(())
    }
}

#[async_trait]
impl Relocator for FsRelocator {
    async fn relocate(
        &self,
        source: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> Result<(), RelocateError> {
        let moved = if overwrite {
            fs::rename(source, destination).await
        } else {
            Self::claim(source, destination).await
        };
        match moved {
            Ok(()) => {
                if !overwrite {
                    remove_quietly(source, "staged source after link").await;
                }
                Ok(())
            }
            Err(err) if !overwrite && err.kind() == io::ErrorKind::AlreadyExists => {
                Err(RelocateError::AlreadyExists {
                    path: destination.to_path_buf(),
                })
            }
            Err(err) if needs_copy(&err) => {
                debug!(
                    source = %source.display(),
                    destination = %destination.display(),
                    "rename unavailable; copying instead"
                );
                Self::copy_verify_remove(source, destination, overwrite).await
            }
            Err(err) => Err(RelocateError::io(
                if overwrite {
                    "relocate.rename"
                } else {
                    "relocate.link"
                },
                source,
                err,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn rename_moves_and_overwrites() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("staged");
        let destination = temp.path().join("page.html");
        std::fs::write(&source, "new")?;
        std::fs::write(&destination, "old")?;

        FsRelocator.relocate(&source, &destination, true).await?;
        assert!(!source.exists());
        assert_eq!(std::fs::read_to_string(&destination)?, "new");
        Ok(())
    }

    #[tokio::test]
    async fn existing_destination_is_kept_without_overwrite() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("staged");
        let destination = temp.path().join("page.html");
        std::fs::write(&source, "new")?;
        std::fs::write(&destination, "old")?;

        let err = FsRelocator
            .relocate(&source, &destination, false)
            .await
            .expect_err("destination occupied");
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read_to_string(&destination)?, "old");
        assert!(source.exists());
        Ok(())
    }

    fn names_in(dir: &Path) -> anyhow::Result<Vec<String>> {
        let mut names = std::fs::read_dir(dir)?
            .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
            .collect::<anyhow::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    #[tokio::test]
    async fn copy_fallback_publishes_without_leftovers() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let staging = temp.path().join("staging");
        let root = temp.path().join("downloads");
        std::fs::create_dir_all(&staging)?;
        std::fs::create_dir_all(&root)?;
        let source = staging.join("staged");
        let destination = root.join("page.html");
        std::fs::write(&source, "payload")?;
        std::fs::write(&destination, "old")?;

        FsRelocator::copy_verify_remove(&source, &destination, true).await?;
        assert!(!source.exists());
        assert_eq!(std::fs::read_to_string(&destination)?, "payload");
        assert_eq!(names_in(&root)?, ["page.html"]);
        Ok(())
    }

    #[tokio::test]
    async fn copy_fallback_refuses_occupied_name_without_overwrite() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let staging = temp.path().join("staging");
        let root = temp.path().join("downloads");
        std::fs::create_dir_all(&staging)?;
        std::fs::create_dir_all(&root)?;
        let source = staging.join("staged");
        let destination = root.join("page.html");
        std::fs::write(&source, "new")?;
        std::fs::write(&destination, "old")?;

        let err = FsRelocator::copy_verify_remove(&source, &destination, false)
            .await
            .expect_err("destination occupied");
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(std::fs::read_to_string(&destination)?, "old");
        assert_eq!(names_in(&root)?, ["page.html"]);
        assert!(source.exists());

        std::fs::remove_file(&destination)?;
        FsRelocator::copy_verify_remove(&source, &destination, false).await?;
        assert_eq!(std::fs::read_to_string(&destination)?, "new");
        assert_eq!(names_in(&root)?, ["page.html"]);
        Ok(())
    }

    #[test]
    fn partial_copies_are_hidden_siblings() {
        let partial = partial_path(Path::new("/srv/downloads/page.html"));
        assert_eq!(partial.parent(), Some(Path::new("/srv/downloads")));
        let name = partial
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert!(name.starts_with(".page.html."), "{name}");
        assert!(name.ends_with(".partial"), "{name}");
    }

    #[tokio::test]
    async fn missing_source_is_an_io_error() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        for overwrite in [true, false] {
            let err = FsRelocator
                .relocate(
                    &temp.path().join("absent"),
                    &temp.path().join("page.html"),
                    overwrite,
                )
                .await
                .expect_err("nothing to move");
            assert_eq!(err.kind(), ErrorKind::IoError);
        }
        Ok(())
    }

    #[tokio::test]
    async fn link_claim_moves_into_free_name() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let source = temp.path().join("staged");
        let destination = temp.path().join("page.html");
        std::fs::write(&source, "new")?;

        FsRelocator.relocate(&source, &destination, false).await?;
        assert!(!source.exists());
        assert_eq!(std::fs::read_to_string(&destination)?, "new");
        Ok(())
    }
}
