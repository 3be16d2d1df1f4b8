//! Configuration snapshot and staging endpoints.
//!
//! Updates never touch a running watcher: accepted patches are staged and
//! applied on the next start.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Serialize;
use signet_config::{WatchConfig, WatchConfigPatch};
use tracing::{info, warn};

use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Debug, Serialize)]
pub(crate) struct ConfigSnapshotResponse {
    pub(crate) active: WatchConfig,
    pub(crate) pending: Option<WatchConfig>,
    pub(crate) restart_required: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ConfigUpdateResponse {
    pub(crate) message: &'static str,
    pub(crate) changed: Vec<&'static str>,
    pub(crate) pending: WatchConfig,
    pub(crate) restart_required: bool,
}

pub(crate) async fn get_config(State(state): State<Arc<ApiState>>) -> Json<ConfigSnapshotResponse> {
    let pending = state
        .service
        .pending_config()
        .map(|config| WatchConfig::clone(&config));
    Json(ConfigSnapshotResponse {
        active: WatchConfig::clone(&state.service.config()),
        restart_required: pending.is_some(),
        pending,
    })
}

pub(crate) async fn update_config(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<WatchConfigPatch>, JsonRejection>,
) -> Result<Json<ConfigUpdateResponse>, ApiError> {
    let Json(patch) = payload.map_err(|rejection| {
        warn!(error = %rejection, "rejected configuration payload");
        ApiError::bad_request(rejection.body_text())
    })?;
    if patch.is_empty() {
        return Err(ApiError::bad_request("no configuration changes supplied"));
    }

    let pending = state.service.stage_config(&patch).map_err(|err| {
        warn!(error = %err, detail = %err.detail(), "configuration update rejected");
        ApiError::from_pipeline(&err)
    })?;
    info!(changed = ?patch.changed_fields(), "configuration update staged");
    Ok(Json(ConfigUpdateResponse {
        message: "Configuration updated. Restart the watcher to apply changes.",
        changed: patch.changed_fields(),
        pending: WatchConfig::clone(&pending),
        restart_required: true,
    }))
}
