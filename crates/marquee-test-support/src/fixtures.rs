//! Temporary namespaces, configurations, and databases for tests.

use std::path::{Path, PathBuf};

use anyhow::Result;
use marquee_config::{IngestPolicy, ServerConfig, TelemetryConfig, defaults};
use marquee_data::Database;
use tempfile::TempDir;

/// Namespace root and staging directory inside one temporary directory.
pub struct TestNamespace {
    temp: TempDir,
    root: PathBuf,
    staging: PathBuf,
}

impl TestNamespace {
    /// Create empty `downloads/` and `staging/` directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directories cannot be created.
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().join("downloads");
        let staging = temp.path().join("staging");
        std::fs::create_dir_all(&root)?;
        std::fs::create_dir_all(&staging)?;
        Ok(Self {
            temp,
            root,
            staging,
        })
    }

    /// Namespace root served to devices.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Staging directory for uploads.
    #[must_use]
    pub fn staging(&self) -> &Path {
        &self.staging
    }

    /// Parent of the namespace root; never served.
    #[must_use]
    pub fn outside(&self) -> &Path {
        self.temp.path()
    }

    /// Write `contents` to `name` under the namespace root.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Sorted names directly under the namespace root.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn entries(&self) -> Result<Vec<String>> {
        let mut names = std::fs::read_dir(&self.root)?
            .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
            .collect::<Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    /// Number of files left in the staging directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn staged_count(&self) -> Result<usize> {
        Ok(std::fs::read_dir(&self.staging)?.count())
    }

    /// Default server configuration pointing at this namespace.
    #[must_use]
    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: defaults::BIND_ADDR,
            http_port: defaults::HTTP_PORT,
            database_url: "sqlite::memory:".to_string(),
            namespace_root: self.root.clone(),
            staging_dir: self.staging.clone(),
            ingest: IngestPolicy {
                max_batch_files: defaults::MAX_BATCH_FILES,
                max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
                batch_timeout: None,
                overwrite_existing: true,
            },
            admin_token: None,
            telemetry: TelemetryConfig {
                log_level: defaults::LOG_LEVEL.to_string(),
                log_format: None,
            },
        }
    }
}

/// Fresh migrated in-memory database.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated.
pub async fn memory_database() -> Result<Database> {
    Ok(Database::in_memory().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_is_created_empty() -> Result<()> {
        let namespace = TestNamespace::new()?;
        assert!(namespace.root().is_dir());
        assert!(namespace.staging().is_dir());
        assert!(namespace.entries()?.is_empty());
        namespace.write("page.html", "hi")?;
        assert_eq!(namespace.entries()?, ["page.html"]);
        assert_eq!(namespace.config().namespace_root, namespace.root());
        Ok(())
    }

    #[tokio::test]
    async fn memory_database_is_migrated() -> Result<()> {
        let db = memory_database().await?;
        sqlx::query("SELECT COUNT(*) FROM devices")
            .execute(db.pool())
            .await?;
        Ok(())
    }
}
