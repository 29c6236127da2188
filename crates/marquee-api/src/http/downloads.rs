//! Streaming of files from the restricted namespace.

use std::sync::Arc;

use axum::{
    Extension,
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use futures_util::TryStreamExt;
use marquee_fsops::FsOpsError;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

use crate::http::errors::ApiError;
use crate::http::gateway::AuthorizedDevice;
use crate::state::ApiState;

pub(crate) async fn serve_download(
    State(state): State<Arc<ApiState>>,
    Extension(AuthorizedDevice(device)): Extension<AuthorizedDevice>,
    Path(requested): Path<String>,
) -> Result<Response, ApiError> {
    let resource = match marquee_fsops::open(&requested, &state.namespace_root).await {
        Ok(resource) => resource,
        Err(FsOpsError::PathTraversal { .. }) => {
            warn!(device_id = %device.id, path = %requested, "path escapes namespace");
            return Err(ApiError::forbidden());
        }
        Err(FsOpsError::NotFound { .. }) => {
            return Err(ApiError::not_found("no such file"));
        }
        Err(err) => {
            error!(device_id = %device.id, path = %requested, error = %err, "failed to open file");
            return Err(ApiError::internal("failed to open file"));
        }
    };

    let mime = mime_guess::from_path(&resource.path).first_or_octet_stream();
    let content_type = HeaderValue::from_str(mime.essence_str())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    debug!(device_id = %device.id, path = %requested, size = resource.len, "streaming file");

    let device_id = device.id;
    let path = requested;
    // Headers are already on the wire when a read fails; log and end the body.
    let stream = ReaderStream::new(resource.file).inspect_err(move |err| {
        warn!(device_id = %device_id, path = %path, error = %err, "download interrupted");
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, resource.len)
        .body(Body::from_stream(stream))
        .map_err(|err| {
            error!(error = %err, "failed to build download response");
            ApiError::internal("failed to build download response")
        })
}
