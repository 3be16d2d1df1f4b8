//! Health and metrics endpoints.

use std::sync::Arc;

use axum::{Json, body::Body, extract::State, http::StatusCode, response::Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use signet_events::WatcherState;
use signet_telemetry::build_sha;
use tracing::error;

use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) service_status: &'static str,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) build: String,
    pub(crate) degraded: Vec<String>,
}

pub(crate) async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let watcher = state.service.state();
    let degraded = if watcher == WatcherState::Error {
        vec!["watcher".to_string()]
    } else {
        Vec::new()
    };
    Json(HealthResponse {
        status: "healthy",
        service_status: watcher.as_str(),
        timestamp: Utc::now(),
        build: build_sha().to_string(),
        degraded,
    })
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    state.telemetry.set_queue_depth(state.service.queue_depth());
    state.telemetry.set_in_flight(state.service.in_flight_count());
    match state.telemetry.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )
            .body(Body::from(body))
            .map_err(|err| {
                error!(error = %err, "failed to build metrics response");
                ApiError::internal("failed to build metrics response")
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            Err(ApiError::internal("failed to render metrics"))
        }
    }
}
