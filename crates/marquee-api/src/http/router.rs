//! Router construction and server host for the API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, Method, Request, header::CONTENT_TYPE},
    middleware,
    routing::{delete, get, post, put},
};
use marquee_config::ServerConfig;
use marquee_data::{DeviceRegistry, FeedStore};
use marquee_fsops::{
    BatchCleanup, FsRelocator, IngestionBarrier, NamespaceLock, Relocator, StagingArea,
};
use marquee_telemetry::{Metrics, REQUEST_ID_HEADER, build_sha, request_id_layers};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::admin::require_admin;
use crate::http::constants::{HEADER_ADMIN_TOKEN, WATCH_PAGES_PATH};
use crate::http::devices::{
    create_device, delete_device, list_devices, set_device_active, toggle_device,
};
use crate::http::downloads::serve_download;
use crate::http::feed::{last_message, matches, ticker};
use crate::http::gateway::{forbid_direct, require_device};
use crate::http::health::{health, metrics};
use crate::http::ingest::{list_watch_pages, purge_watch_pages, upload_watch_pages};
use crate::http::telemetry::record_http_metrics;
use crate::state::ApiState;

/// Axum router wrapper that hosts the Marquee API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Build the API over the configured namespace with filesystem relocation.
    #[must_use]
    pub fn new(
        config: &ServerConfig,
        registry: Arc<dyn DeviceRegistry>,
        feed: FeedStore,
        telemetry: Metrics,
    ) -> Self {
        Self::with_relocator(config, registry, feed, telemetry, Arc::new(FsRelocator))
    }

    /// Build the API with a custom relocation strategy for batch uploads.
    #[must_use]
    pub fn with_relocator(
        config: &ServerConfig,
        registry: Arc<dyn DeviceRegistry>,
        feed: FeedStore,
        telemetry: Metrics,
        relocator: Arc<dyn Relocator>,
    ) -> Self {
        let state = Self::build_state(config, registry, feed, telemetry, relocator);
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE, HeaderName::from_static(HEADER_ADMIN_TOKEN)]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(request_id_layers())
            .layer(trace_layer)
            .layer(middleware::from_fn_with_state(
                state.clone(),
                record_http_metrics,
            ));

        let router = Self::public_routes()
            .merge(Self::download_routes(&state))
            .merge(Self::admin_routes(&state, config.ingest.max_upload_bytes))
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    fn build_state(
        config: &ServerConfig,
        registry: Arc<dyn DeviceRegistry>,
        feed: FeedStore,
        telemetry: Metrics,
        relocator: Arc<dyn Relocator>,
    ) -> Arc<ApiState> {
        let lock = NamespaceLock::new();
        let barrier =
            IngestionBarrier::new(&config.namespace_root, lock.clone(), telemetry.clone())
                .with_relocator(relocator)
                .with_overwrite(config.ingest.overwrite_existing);
        let cleanup = BatchCleanup::new(&config.namespace_root, lock, telemetry.clone());
        Arc::new(ApiState {
            registry,
            feed,
            namespace_root: config.namespace_root.clone(),
            staging: StagingArea::new(&config.staging_dir),
            barrier,
            cleanup,
            policy: config.ingest.clone(),
            admin_token: config.admin_token.clone(),
            telemetry,
        })
    }

    fn public_routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .route("/ticker", get(ticker))
            .route("/matches", get(matches))
            .route("/last-message", get(last_message))
    }

    fn download_routes(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
        let require_device = middleware::from_fn_with_state(state.clone(), require_device);

        Router::new()
            .route("/downloads", get(forbid_direct))
            .route("/downloads/", get(forbid_direct))
            .route(
                "/downloads/{*path}",
                get(serve_download).route_layer(require_device),
            )
    }

    fn admin_routes(state: &Arc<ApiState>, max_upload_bytes: usize) -> Router<Arc<ApiState>> {
        let require_admin = middleware::from_fn_with_state(state.clone(), require_admin);

        Router::new()
            .route(
                "/admin/devices",
                get(list_devices)
                    .post(create_device)
                    .route_layer(require_admin.clone()),
            )
            .route(
                "/admin/devices/{id}",
                delete(delete_device).route_layer(require_admin.clone()),
            )
            .route(
                "/admin/devices/{id}/toggle",
                post(toggle_device).route_layer(require_admin.clone()),
            )
            .route(
                "/admin/devices/{id}/active",
                put(set_device_active).route_layer(require_admin.clone()),
            )
            .route(
                WATCH_PAGES_PATH,
                get(list_watch_pages)
                    .post(upload_watch_pages)
                    .layer(DefaultBodyLimit::max(max_upload_bytes))
                    .route_layer(require_admin.clone()),
            )
            .route(
                "/admin/watch-pages/purge",
                post(purge_watch_pages).route_layer(require_admin),
            )
    }

    /// Router with all routes and layers applied.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve the API on the supplied address until the server stops.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve(self, addr: SocketAddr) -> ApiServerResult<()> {
        tracing::info!(%addr, "starting API");
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        axum::serve(listener, self.router.into_make_service())
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }
}
