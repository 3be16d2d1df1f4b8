//! Watcher lifecycle endpoints.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use signet_pipeline::{
    FilenameClassifier, FilenameMetadata, PipelineError, SampleReport, ServiceStatus,
    WatcherState, create_sample_files, rename_in_workplace,
};
use tracing::{error, info, warn};

use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Debug, Serialize)]
pub(crate) struct LifecycleResponse {
    pub(crate) message: &'static str,
    pub(crate) status: ServiceStatus,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SampleRequest {
    #[serde(default)]
    pub(crate) force: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SampleResponse {
    pub(crate) message: String,
    #[serde(flatten)]
    pub(crate) report: SampleReport,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RenameRequest {
    pub(crate) original_name: String,
    pub(crate) new_name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RenameResponse {
    pub(crate) message: String,
    pub(crate) file_path: PathBuf,
    pub(crate) parsed_metadata: Option<FilenameMetadata>,
    pub(crate) would_process: bool,
    pub(crate) reason: &'static str,
    pub(crate) service_running: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct DebugResponse {
    pub(crate) status: &'static str,
    pub(crate) state_status: WatcherState,
    pub(crate) watch_active: bool,
    pub(crate) worker_active: bool,
    pub(crate) queue_size: usize,
    pub(crate) in_flight: usize,
    pub(crate) logs_count: usize,
}

pub(crate) async fn status(State(state): State<Arc<ApiState>>) -> Json<ServiceStatus> {
    Json(state.service.status())
}

pub(crate) async fn start(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    match state.service.start().await {
        Ok(()) => Ok(Json(LifecycleResponse {
            message: "watcher started",
            status: state.service.status(),
        })),
        Err(PipelineError::AlreadyRunning) => {
            Err(ApiError::conflict("watcher is already running"))
        }
        Err(err) => {
            error!(error = %err, detail = %err.detail(), "watcher failed to start");
            Err(ApiError::internal(err.detail()))
        }
    }
}

pub(crate) async fn stop(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    match state.service.stop().await {
        Ok(()) => Ok(Json(LifecycleResponse {
            message: "watcher stopped",
            status: state.service.status(),
        })),
        Err(PipelineError::NotRunning) => Err(ApiError::conflict("watcher is not running")),
        Err(err) => {
            error!(error = %err, "watcher failed to stop");
            Err(ApiError::from_pipeline(&err))
        }
    }
}

pub(crate) async fn force_reset(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<LifecycleResponse>, ApiError> {
    state.service.force_reset().await.map_err(|err| {
        error!(error = %err, "force reset failed");
        ApiError::from_pipeline(&err)
    })?;
    Ok(Json(LifecycleResponse {
        message: "watcher state reset",
        status: state.service.status(),
    }))
}

pub(crate) async fn create_sample(
    State(state): State<Arc<ApiState>>,
    payload: Option<Json<SampleRequest>>,
) -> Result<Json<SampleResponse>, ApiError> {
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let workplace = state.service.config().workplace_path.clone();

    let report = tokio::task::spawn_blocking(move || create_sample_files(&workplace, request.force))
        .await
        .map_err(|err| {
            error!(error = %err, "sample file task failed");
            ApiError::internal("sample file task failed")
        })?
        .map_err(|err| {
            warn!(error = %err, detail = %err.detail(), "failed to create sample files");
            ApiError::from_pipeline(&err)
        })?;

    info!(
        created = report.created_files.len(),
        existing = report.existing_files.len(),
        "sample files written"
    );
    Ok(Json(SampleResponse {
        message: format!("Created {} sample files", report.created_files.len()),
        report,
    }))
}

pub(crate) async fn rename_file(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<RenameResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "rejected rename payload");
        ApiError::bad_request(rejection.body_text())
    })?;
    let config = state.service.config();
    let classifier =
        FilenameClassifier::from_config(&config).map_err(|err| ApiError::from_pipeline(&err))?;

    let workplace = config.workplace_path.clone();
    let (original_name, new_name) = (request.original_name.clone(), request.new_name.clone());
    let file_path = tokio::task::spawn_blocking(move || {
        rename_in_workplace(&workplace, &original_name, &new_name)
    })
    .await
    .map_err(|err| {
        error!(error = %err, "rename task failed");
        ApiError::internal("rename task failed")
    })?
    .map_err(|err| {
        warn!(error = %err, detail = %err.detail(), "rename in workplace failed");
        rename_error(&err)
    })?;

    let verdict = classifier.verdict(&request.new_name);
    Ok(Json(RenameResponse {
        message: format!(
            "File renamed from {} to {}",
            request.original_name, request.new_name
        ),
        file_path,
        parsed_metadata: verdict.metadata().cloned(),
        would_process: verdict.is_signed(),
        reason: verdict.reason(),
        service_running: state.service.is_running(),
    }))
}

fn rename_error(err: &PipelineError) -> ApiError {
    match err {
        PipelineError::Io { source, .. } if source.kind() == io::ErrorKind::InvalidInput => {
            ApiError::bad_request(err.detail())
        }
        PipelineError::Io { source, .. } if source.kind() == io::ErrorKind::AlreadyExists => {
            ApiError::conflict(err.detail())
        }
        _ => ApiError::from_pipeline(err),
    }
}

pub(crate) async fn debug_info(State(state): State<Arc<ApiState>>) -> Json<DebugResponse> {
    let status = state.service.status();
    let activity = state.service.activity();
    Json(DebugResponse {
        status: "debug_ok",
        state_status: status.state,
        watch_active: activity.watch_active,
        worker_active: activity.worker_active,
        queue_size: status.queue_size,
        in_flight: status.in_flight,
        logs_count: signet_telemetry::retained_log_lines(),
    })
}
