//! RFC9457-style API error wrapper.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use signet_pipeline::PipelineError;

use crate::http::constants::{
    PROBLEM_BAD_REQUEST, PROBLEM_CONFIG_INVALID, PROBLEM_CONFLICT, PROBLEM_INTERNAL,
};

/// Problem document returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct ProblemDetails {
    #[serde(rename = "type")]
    pub(crate) kind: String,
    pub(crate) title: String,
    pub(crate) status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) invalid_params: Option<Vec<ProblemInvalidParam>>,
}

/// Pointer to a rejected input field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct ProblemInvalidParam {
    pub(crate) pointer: String,
    pub(crate) message: String,
}

/// Structured API error with optional RFC9457 fields.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    title: &'static str,
    detail: Option<String>,
    invalid_params: Option<Vec<ProblemInvalidParam>>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
            invalid_params: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn with_invalid_params(mut self, params: Vec<ProblemInvalidParam>) -> Self {
        self.invalid_params = Some(params);
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    pub(crate) fn conflict(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, PROBLEM_CONFLICT, "conflict").with_detail(detail)
    }

    pub(crate) fn config_invalid(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            PROBLEM_CONFIG_INVALID,
            "configuration invalid",
        )
        .with_detail(detail)
    }

    /// Map a pipeline failure onto the closest HTTP problem.
    pub(crate) fn from_pipeline(err: &PipelineError) -> Self {
        match err {
            PipelineError::AlreadyRunning | PipelineError::NotRunning => {
                Self::conflict(err.to_string())
            }
            PipelineError::Config { source } => {
                let mut problem = Self::config_invalid(err.detail());
                if let Some(field) = source.field() {
                    problem = problem.with_invalid_params(vec![ProblemInvalidParam {
                        pointer: format!("/{field}"),
                        message: source.reason().unwrap_or("invalid").to_string(),
                    }]);
                }
                problem
            }
            PipelineError::InvalidPattern { .. } => Self::config_invalid(err.detail()),
            _ => Self::internal(err.detail()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            invalid_params: self.invalid_params,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signet_config::ConfigError;

    #[test]
    fn lifecycle_conflicts_map_to_409() {
        let problem = ApiError::from_pipeline(&PipelineError::AlreadyRunning);
        assert_eq!(problem.status, StatusCode::CONFLICT);
        assert_eq!(problem.kind, PROBLEM_CONFLICT);

        let problem = ApiError::from_pipeline(&PipelineError::NotRunning);
        assert_eq!(problem.status, StatusCode::CONFLICT);
    }

    #[test]
    fn config_errors_carry_invalid_params() {
        let err = PipelineError::Config {
            source: ConfigError::InvalidField {
                section: "watch",
                field: "poll_interval_ms",
                value: Some("1".to_string()),
                reason: "out_of_range",
            },
        };
        let problem = ApiError::from_pipeline(&err);
        assert_eq!(problem.status, StatusCode::BAD_REQUEST);
        let params = problem.invalid_params.unwrap_or_default();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].pointer, "/poll_interval_ms");
        assert_eq!(params[0].message, "out_of_range");
    }

    #[test]
    fn worker_failures_map_to_500() {
        let problem = ApiError::from_pipeline(&PipelineError::WorkerJoin { reason: "timeout" });
        assert_eq!(problem.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(problem.detail.is_some());
    }
}
