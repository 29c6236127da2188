//! Read-only display feeds.

use std::sync::Arc;

use axum::{Json, extract::State};
use marquee_data::{DataError, LastMessage, MatchRow, TickerRow};
use tracing::error;

use crate::http::errors::ApiError;
use crate::state::ApiState;

fn feed_error(err: &DataError) -> ApiError {
    error!(error = %err, "feed query failed");
    ApiError::internal("failed to load feed")
}

pub(crate) async fn ticker(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<TickerRow>>, ApiError> {
    state
        .feed
        .list_ticker()
        .await
        .map(Json)
        .map_err(|err| feed_error(&err))
}

pub(crate) async fn matches(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<MatchRow>>, ApiError> {
    state
        .feed
        .list_matches()
        .await
        .map(Json)
        .map_err(|err| feed_error(&err))
}

pub(crate) async fn last_message(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<LastMessage>, ApiError> {
    state
        .feed
        .last_message()
        .await
        .map(Json)
        .map_err(|err| feed_error(&err))
}
