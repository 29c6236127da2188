//! Restricted resource resolution.
//!
//! Requested paths are checked lexically first (relative, no `..`, no root or
//! prefix components) and then canonically: the canonical target must stay
//! under the canonical namespace root, which also catches symlinks that point
//! outside it.

use std::io;
use std::path::{Component, Path, PathBuf};

use tokio::fs::{self, File};

use crate::error::{FsOpsError, FsOpsResult};

/// A resolved file opened for streaming.
#[derive(Debug)]
pub struct OpenedResource {
    /// Canonical path of the file.
    pub path: PathBuf,
    /// Size in bytes at open time.
    pub len: u64,
    /// Open handle positioned at the start.
    pub file: File,
}

fn traversal(requested: &str) -> FsOpsError {
    FsOpsError::PathTraversal {
        requested: requested.to_string(),
    }
}

fn lexical_relative(requested: &str) -> FsOpsResult<PathBuf> {
    if requested.is_empty() || requested.contains('\0') {
        return Err(traversal(requested));
    }
    let mut relative = PathBuf::new();
    for component in Path::new(requested).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(traversal(requested));
            }
        }
    }
    if relative.as_os_str().is_empty() {
        return Err(traversal(requested));
    }
    Ok(relative)
}

/// Map `requested` to a canonical path strictly inside `root`.
///
/// # Errors
///
/// - [`FsOpsError::PathTraversal`] when the path escapes the root, lexically
///   or through a symlink.
/// - [`FsOpsError::NotFound`] when nothing exists at the path.
/// - [`FsOpsError::Io`] for any other filesystem failure.
pub async fn resolve(requested: &str, root: &Path) -> FsOpsResult<PathBuf> {
    let relative = lexical_relative(requested)?;
    let canonical_root = fs::canonicalize(root)
        .await
        .map_err(|source| FsOpsError::io("resolve.canonicalize_root", root, source))?;
    let candidate = canonical_root.join(&relative);
    let canonical = match fs::canonicalize(&candidate).await {
        Ok(path) => path,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(FsOpsError::NotFound {
                requested: requested.to_string(),
            });
        }
        Err(source) => return Err(FsOpsError::io("resolve.canonicalize", candidate, source)),
    };
    if canonical == canonical_root || !canonical.starts_with(&canonical_root) {
        return Err(traversal(requested));
    }
    Ok(canonical)
}

/// Resolve `requested` under `root` and open it for reading.
///
/// Directories are reported as [`FsOpsError::NotFound`]; the namespace is
/// never listed through this path.
///
/// # Errors
///
/// See [`resolve`]; opening or inspecting the file can also fail with
/// [`FsOpsError::Io`].
pub async fn open(requested: &str, root: &Path) -> FsOpsResult<OpenedResource> {
    let path = resolve(requested, root).await?;
    let file = File::open(&path)
        .await
        .map_err(|source| FsOpsError::io("resolve.open", &path, source))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|source| FsOpsError::io("resolve.metadata", &path, source))?;
    if !metadata.is_file() {
        return Err(FsOpsError::NotFound {
            requested: requested.to_string(),
        });
    }
    Ok(OpenedResource {
        path,
        len: metadata.len(),
        file,
    })
}

/// Sorted names of the entries directly under `root`.
///
/// # Errors
///
/// Returns [`FsOpsError::Io`] if the directory cannot be read.
pub async fn list_files(root: &Path) -> FsOpsResult<Vec<String>> {
    let mut entries = fs::read_dir(root)
        .await
        .map_err(|source| FsOpsError::io("list.read_dir", root, source))?;
    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|source| FsOpsError::io("list.next_entry", root, source))?
    {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
