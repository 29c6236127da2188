//! Per-route request counting.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::ApiState;

const UNMATCHED_ROUTE: &str = "unmatched";

/// Count every routed request under its route template and status code.
pub(crate) async fn record_http_metrics(
    State(state): State<Arc<ApiState>>,
    req: Request,
    next: Next,
) -> Response {
    // Route template, never the raw path.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or(UNMATCHED_ROUTE, MatchedPath::as_str)
        .to_owned();
    let response = next.run(req).await;
    state
        .telemetry
        .inc_http_request(&route, response.status().as_u16());
    response
}
