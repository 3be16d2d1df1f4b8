//! Processed-file history and preview endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use signet_pipeline::{PreviewReport, ProcessingOutcome};
use tracing::warn;

use crate::http::constants::DEFAULT_FILES_LIMIT;
use crate::http::errors::ApiError;
use crate::state::ApiState;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RecentQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RecentFilesResponse {
    pub(crate) files: Vec<ProcessingOutcome>,
    pub(crate) total: usize,
    pub(crate) has_more: bool,
}

/// Newest outcomes first.
pub(crate) async fn recent_files(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<RecentQuery>,
) -> Json<RecentFilesResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_FILES_LIMIT);
    let files = state.service.recent_outcomes(limit);
    let total = state.service.retained_outcomes();
    Json(RecentFilesResponse {
        has_more: total > files.len(),
        files,
        total,
    })
}

pub(crate) async fn preview(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<PreviewReport>, ApiError> {
    state.service.preview().await.map(Json).map_err(|err| {
        warn!(error = %err, detail = %err.detail(), "preview failed");
        ApiError::from_pipeline(&err)
    })
}
