//! Operator routes for the ingestion namespace: batch upload, listing, purge.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use marquee_fsops::{FsOpsError, IngestionBatch, UploadItem};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::http::constants::{UPLOAD_FIELD, WATCH_PAGES_PATH};
use crate::http::errors::ApiError;
use crate::state::ApiState;

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

fn multipart_error(err: &MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("upload exceeds the configured size limit")
    } else {
        ApiError::bad_request(err.body_text())
    }
}

/// Stage every upload field into `items`. Entries are pushed before they are
/// written; dropping `items` removes everything staged so far.
async fn receive_items(
    state: &ApiState,
    multipart: &mut Multipart,
    items: &mut Vec<UploadItem>,
) -> Result<(), ApiError> {
    let limit = state.policy.max_batch_files;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(&err))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if items.len() == limit {
            return Err(ApiError::bad_request(format!(
                "a batch may contain at most {limit} files"
            )));
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let (temp_location, mut file) = state.staging.create().await.map_err(|err| {
            error!(error = %err, "failed to stage upload");
            ApiError::internal("failed to stage upload")
        })?;
        items.push(UploadItem {
            temp_location,
            original_name,
            size: 0,
        });
        let mut size = 0_u64;
        while let Some(chunk) = field.chunk().await.map_err(|err| multipart_error(&err))? {
            file.write_all(&chunk).await.map_err(|err| {
                error!(error = %err, "failed to write staged upload");
                ApiError::internal("failed to stage upload")
            })?;
            size += chunk.len() as u64;
        }
        file.flush().await.map_err(|err| {
            error!(error = %err, "failed to flush staged upload");
            ApiError::internal("failed to stage upload")
        })?;
        if let Some(item) = items.last_mut() {
            item.size = size;
        }
    }
    Ok(())
}

pub(crate) async fn upload_watch_pages(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut items = Vec::new();
    if let Err(err) = receive_items(&state, &mut multipart, &mut items).await {
        warn!(staged = items.len(), status = %err.status, "upload rejected");
        return Err(err);
    }

    let handle = state.barrier.dispatch(IngestionBatch::new(items)).await;
    let batch_id = handle.batch_id();
    let settled = match state.policy.batch_timeout {
        Some(deadline) => {
            if let Ok(settled) = tokio::time::timeout(deadline, handle.settled()).await {
                settled
            } else {
                state.telemetry.inc_ingest_batch("timed_out");
                warn!(%batch_id, "batch still relocating at deadline");
                return Err(ApiError::gateway_timeout(format!(
                    "batch {batch_id} is still relocating"
                )));
            }
        }
        None => handle.settled().await,
    };
    let outcome = settled.map_err(|err| {
        error!(%batch_id, error = %err, "batch did not settle");
        ApiError::internal("batch did not settle")
    })?;

    if wants_json(&headers) {
        Ok(Json(outcome).into_response())
    } else {
        Ok(Redirect::to(WATCH_PAGES_PATH).into_response())
    }
}

pub(crate) async fn list_watch_pages(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    marquee_fsops::list_files(&state.namespace_root)
        .await
        .map(Json)
        .map_err(|err| {
            error!(error = %err, "failed to list namespace");
            ApiError::internal("failed to list watch pages")
        })
}

pub(crate) async fn purge_watch_pages(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    match state.cleanup.purge().await {
        Ok(report) => {
            info!(deleted = report.deleted, "watch pages purged");
            if wants_json(&headers) {
                Ok(Json(report).into_response())
            } else {
                Ok(Redirect::to(WATCH_PAGES_PATH).into_response())
            }
        }
        Err(FsOpsError::CleanupIncomplete { report }) => {
            if wants_json(&headers) {
                Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(report)).into_response())
            } else {
                Err(ApiError::internal(format!(
                    "{} of {} entries could not be removed",
                    report.failures.len(),
                    report.failures.len() + report.deleted
                )))
            }
        }
        Err(err) => {
            error!(error = %err, "failed to purge watch pages");
            Err(ApiError::internal("failed to purge watch pages"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn json_is_negotiated_from_accept() {
        let mut headers = HeaderMap::new();
        assert!(!wants_json(&headers));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        assert!(!wants_json(&headers));
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/json, text/plain"),
        );
        assert!(wants_json(&headers));
    }
}
