//! Device administration handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use marquee_data::{DeviceRecord, RegistryError};
use tracing::{error, info};

use crate::http::errors::ApiError;
use crate::models::{CreateDeviceRequest, SetActiveRequest};
use crate::state::ApiState;

fn registry_error(err: RegistryError) -> ApiError {
    match err {
        RegistryError::NotFound { .. } => ApiError::not_found("device not found"),
        RegistryError::DuplicateId { .. } => {
            ApiError::conflict("a device with this id is already registered")
        }
        RegistryError::InvalidId { .. } => {
            ApiError::bad_request("device id must be non-empty without surrounding whitespace")
        }
        err @ RegistryError::Unavailable { .. } => {
            error!(error = %err, "device registry unavailable");
            ApiError::service_unavailable("device registry unavailable")
        }
    }
}

pub(crate) async fn list_devices(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<DeviceRecord>>, ApiError> {
    state.registry.list().await.map(Json).map_err(registry_error)
}

pub(crate) async fn create_device(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceRecord>), ApiError> {
    let record = DeviceRecord::new(request.id, request.display_name);
    state
        .registry
        .insert(&record)
        .await
        .map_err(registry_error)?;
    info!(device_id = %record.id, "device registered");
    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn toggle_device(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<Json<DeviceRecord>, ApiError> {
    let record = state.registry.toggle(&id).await.map_err(registry_error)?;
    info!(device_id = %record.id, active = record.active, "device toggled");
    Ok(Json(record))
}

pub(crate) async fn set_device_active(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<DeviceRecord>, ApiError> {
    let record = state
        .registry
        .set_active(&id, request.active)
        .await
        .map_err(registry_error)?;
    info!(device_id = %record.id, active = record.active, "device activation set");
    Ok(Json(record))
}

pub(crate) async fn delete_device(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.registry.delete(&id).await.map_err(registry_error)?;
    info!(device_id = %id, "device removed");
    Ok(StatusCode::NO_CONTENT)
}
