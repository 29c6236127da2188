//! Device authorization gateway for the restricted namespace.
//!
//! Every request under the download prefix passes through [`require_device`].
//! Denials for a missing identifier, an unknown identifier, and an inactive
//! device produce the same response; only registry outages differ.

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use marquee_data::{DeviceRecord, RegistryError};
use marquee_telemetry::AccessDecision;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::http::errors::ApiError;
use crate::state::ApiState;

/// Query parameters carrying the caller's device identifier.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CallerQuery {
    user: Option<String>,
    id: Option<String>,
}

impl CallerQuery {
    fn caller_id(self) -> Option<String> {
        self.user
            .or(self.id)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Device resolved by the gateway, available to downstream handlers.
#[derive(Debug, Clone)]
pub(crate) struct AuthorizedDevice(pub(crate) DeviceRecord);

pub(crate) async fn require_device(
    State(state): State<Arc<ApiState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = Query::<CallerQuery>::try_from_uri(req.uri())
        .map(|Query(query)| query)
        .unwrap_or_default()
        .caller_id();

    let Some(caller_id) = caller else {
        state
            .telemetry
            .inc_device_access(AccessDecision::Unauthenticated);
        warn!(decision = "unauthenticated", "protected fetch without device id");
        return Err(ApiError::forbidden());
    };

    match state.registry.lookup(&caller_id).await {
        Ok(record) if record.active => {
            state.telemetry.inc_device_access(AccessDecision::Granted);
            info!(
                device_id = %record.id,
                display_name = %record.display_name,
                path = %req.uri().path(),
                "device access granted"
            );
            req.extensions_mut().insert(AuthorizedDevice(record));
            Ok(next.run(req).await)
        }
        Ok(_) | Err(RegistryError::NotFound { .. } | RegistryError::InvalidId { .. }) => {
            state.telemetry.inc_device_access(AccessDecision::Forbidden);
            warn!(device_id = %caller_id, decision = "forbidden", "device access denied");
            Err(ApiError::forbidden())
        }
        Err(err) => {
            state
                .telemetry
                .inc_device_access(AccessDecision::BackendUnavailable);
            error!(device_id = %caller_id, error = %err, "device registry unavailable");
            Err(ApiError::internal("device registry unavailable"))
        }
    }
}

/// Direct access to the namespace outside the gated route.
pub(crate) async fn forbid_direct(State(state): State<Arc<ApiState>>) -> ApiError {
    state.telemetry.inc_device_access(AccessDecision::Forbidden);
    warn!(decision = "forbidden", "direct namespace access rejected");
    ApiError::forbidden()
}
