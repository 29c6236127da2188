#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, Response, header},
};
use marquee_api::ApiServer;
use marquee_config::ServerConfig;
use marquee_data::{Database, DeviceRecord, DeviceRegistry};
use marquee_fsops::{FsRelocator, RelocateError, Relocator};
use marquee_telemetry::Metrics;
use marquee_test_support::fixtures::{TestNamespace, memory_database};
use tower::ServiceExt;

pub struct Harness {
    pub namespace: TestNamespace,
    pub db: Database,
    pub metrics: Metrics,
    pub router: Router,
}

impl Harness {
    pub async fn new() -> Result<Self> {
        Self::build(|_| {}, None).await
    }

    pub async fn build(
        configure: impl FnOnce(&mut ServerConfig),
        relocator: Option<Arc<dyn Relocator>>,
    ) -> Result<Self> {
        let namespace = TestNamespace::new()?;
        let db = memory_database().await?;
        let registry: Arc<dyn DeviceRegistry> = Arc::new(db.devices());
        Self::with_registry(namespace, db, registry, configure, relocator)
    }

    pub fn with_registry(
        namespace: TestNamespace,
        db: Database,
        registry: Arc<dyn DeviceRegistry>,
        configure: impl FnOnce(&mut ServerConfig),
        relocator: Option<Arc<dyn Relocator>>,
    ) -> Result<Self> {
        let mut config = namespace.config();
        configure(&mut config);
        let metrics = Metrics::new()?;
        let relocator = relocator.unwrap_or_else(|| Arc::new(FsRelocator));
        let server = ApiServer::with_relocator(
            &config,
            registry,
            db.feed(),
            metrics.clone(),
            relocator,
        );
        Ok(Self {
            namespace,
            db,
            metrics,
            router: server.router(),
        })
    }

    pub async fn register(&self, id: &str, active: bool) -> Result<()> {
        let registry = self.db.devices();
        registry.insert(&DeviceRecord::new(id, format!("{id} screen"))).await?;
        if !active {
            registry.set_active(id, false).await?;
        }
        Ok(())
    }

    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>> {
        Ok(self.router.clone().oneshot(request).await?)
    }

    pub async fn get(&self, uri: &str) -> Result<Response<Body>> {
        self.send(Request::get(uri).body(Body::empty())?).await
    }

    pub async fn upload(&self, files: &[(&str, &str)], json: bool) -> Result<Response<Body>> {
        let (content_type, body) = multipart_body(files);
        let mut request = Request::post("/admin/watch-pages").header(header::CONTENT_TYPE, content_type);
        if json {
            request = request.header(header::ACCEPT, "application/json");
        }
        self.send(request.body(Body::from(body))?).await
    }
}

pub async fn body_bytes(response: Response<Body>) -> Result<Bytes> {
    Ok(axum::body::to_bytes(response.into_body(), usize::MAX).await?)
}

pub async fn body_json(response: Response<Body>) -> Result<serde_json::Value> {
    Ok(serde_json::from_slice(&body_bytes(response).await?)?)
}

pub fn multipart_body(files: &[(&str, &str)]) -> (String, Vec<u8>) {
    let boundary = "marquee-test-boundary";
    let mut body = String::new();
    for (name, contents) in files {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"watchPage\"; filename=\"{name}\"\r\nContent-Type: text/html\r\n\r\n{contents}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));
    (
        format!("multipart/form-data; boundary={boundary}"),
        body.into_bytes(),
    )
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Fails relocation for the named files and moves the rest.
pub struct FailingRelocator {
    pub failing: HashSet<String>,
}

impl FailingRelocator {
    pub fn new(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: names.iter().map(|name| (*name).to_string()).collect(),
        })
    }
}

#[async_trait]
impl Relocator for FailingRelocator {
    async fn relocate(
        &self,
        source: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> Result<(), RelocateError> {
        if self.failing.contains(&file_name(destination)) {
            return Err(RelocateError::Io {
                operation: "test.forced",
                path: destination.to_path_buf(),
                source: std::io::Error::other("forced failure"),
            });
        }
        FsRelocator.relocate(source, destination, overwrite).await
    }
}

/// Moves files after a fixed delay.
pub struct SlowRelocator {
    pub delay: Duration,
}

#[async_trait]
impl Relocator for SlowRelocator {
    async fn relocate(
        &self,
        source: &Path,
        destination: &Path,
        overwrite: bool,
    ) -> Result<(), RelocateError> {
        tokio::time::sleep(self.delay).await;
        FsRelocator.relocate(source, destination, overwrite).await
    }
}
