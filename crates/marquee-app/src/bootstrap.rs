use std::sync::Arc;

use marquee_api::ApiServer;
use marquee_config::{ServerConfig, TelemetryConfig};
use marquee_data::Database;
use marquee_telemetry::{LoggingConfig, Metrics, log_format_from_str};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Dependencies required to serve the Marquee API.
pub struct BootstrapDependencies {
    config: ServerConfig,
    database: Database,
    telemetry: Metrics,
}

impl BootstrapDependencies {
    /// Create the configured directories, open and migrate the database, and
    /// register metrics.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be created, the database cannot
    /// be opened or migrated, or the metrics registry cannot be built.
    pub async fn prepare(config: ServerConfig) -> AppResult<Self> {
        config
            .ensure_directories()
            .map_err(|err| AppError::config("config.ensure_directories", err))?;
        let database = Database::connect(&config.database_url)
            .await
            .map_err(|err| AppError::data("database.connect", err))?;
        let telemetry =
            Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
        Ok(Self {
            config,
            database,
            telemetry,
        })
    }

    /// API server wired to the prepared database and metrics.
    #[must_use]
    pub fn api_server(&self) -> ApiServer {
        ApiServer::new(
            &self.config,
            Arc::new(self.database.devices()),
            self.database.feed(),
            self.telemetry.clone(),
        )
    }
}

/// Entry point for the Marquee boot sequence.
///
/// # Errors
///
/// Returns an error if configuration, dependency construction, or the
/// listener fails.
pub async fn run_app() -> AppResult<()> {
    let config =
        ServerConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
    init_logging(&config.telemetry)?;
    info!("Marquee application bootstrap starting");
    let dependencies = BootstrapDependencies::prepare(config).await?;
    run_app_with(dependencies).await
}

/// Serve the API over injected dependencies until the listener stops.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or terminates abnormally.
pub async fn run_app_with(dependencies: BootstrapDependencies) -> AppResult<()> {
    let addr = dependencies.config.socket_addr();
    info!(
        namespace = %dependencies.config.namespace_root.display(),
        staging = %dependencies.config.staging_dir.display(),
        max_batch_files = dependencies.config.ingest.max_batch_files,
        admin_token = dependencies.config.admin_token.is_some(),
        "Launching API listener on {addr}"
    );
    let serve_result = dependencies.api_server().serve(addr).await;
    dependencies.database.close().await;
    serve_result.map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("API server shutdown complete");
    Ok(())
}

fn init_logging(config: &TelemetryConfig) -> AppResult<()> {
    let logging = LoggingConfig {
        level: &config.log_level,
        format: log_format_from_str(config.log_format.as_deref()),
        ..LoggingConfig::default()
    };
    marquee_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, TcpListener};

    use anyhow::Result;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use marquee_test_support::fixtures::TestNamespace;
    use tower::ServiceExt;

    fn file_backed_config(namespace: &TestNamespace) -> ServerConfig {
        let mut config = namespace.config();
        let base = namespace.outside();
        config.database_url = format!("sqlite://{}", base.join("marquee.db").display());
        config.namespace_root = base.join("served/downloads");
        config.staging_dir = base.join("uploads/tmp");
        config
    }

    #[tokio::test]
    async fn prepare_creates_directories_and_database() -> Result<()> {
        let namespace = TestNamespace::new()?;
        let config = file_backed_config(&namespace);

        let dependencies = BootstrapDependencies::prepare(config.clone()).await?;
        assert!(config.namespace_root.is_dir());
        assert!(config.staging_dir.is_dir());
        assert!(namespace.outside().join("marquee.db").is_file());

        let response = dependencies
            .api_server()
            .router()
            .oneshot(Request::get("/health").body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::OK);
        dependencies.database.close().await;
        Ok(())
    }

    #[tokio::test]
    async fn occupied_port_is_reported_as_bind_failure() -> Result<()> {
        let namespace = TestNamespace::new()?;
        let occupied = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
        let mut config = file_backed_config(&namespace);
        config.bind_addr = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.http_port = occupied.local_addr()?.port();

        let dependencies = BootstrapDependencies::prepare(config).await?;
        let result = run_app_with(dependencies).await;
        assert!(matches!(
            result,
            Err(AppError::ApiServer {
                operation: "api_server.serve",
                source: marquee_api::ApiServerError::Bind { .. },
            })
        ));
        Ok(())
    }
}
