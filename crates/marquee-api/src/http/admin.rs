//! Optional shared-token guard for operator routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::http::constants::HEADER_ADMIN_TOKEN;
use crate::http::errors::ApiError;
use crate::state::ApiState;

pub(crate) async fn require_admin(
    State(state): State<Arc<ApiState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.admin_token.as_ref() else {
        return Ok(next.run(req).await);
    };
    let presented = req
        .headers()
        .get(HEADER_ADMIN_TOKEN)
        .and_then(|value| value.to_str().ok())
        .map(str::trim);
    match presented {
        Some(token) if expected.matches(token) => Ok(next.run(req).await),
        Some(_) => {
            warn!(path = %req.uri().path(), "operator request with invalid token");
            Err(ApiError::unauthorized("invalid admin token"))
        }
        None => Err(ApiError::unauthorized("missing admin token header")),
    }
}
