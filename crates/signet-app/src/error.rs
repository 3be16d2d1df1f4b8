//! # Design
//!
//! - Centralize application-level errors for bootstrap and shutdown.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: signet_config::ConfigError,
    },
    /// API server operations failed.
    #[error("api server operation failed")]
    ApiServer {
        /// Operation identifier.
        operation: &'static str,
        /// Source API server error.
        source: signet_api::ApiServerError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: signet_telemetry::TelemetryError,
    },
    /// Watch pipeline operations failed.
    #[error("watch pipeline operation failed")]
    Pipeline {
        /// Operation identifier.
        operation: &'static str,
        /// Source pipeline error.
        source: signet_pipeline::PipelineError,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: signet_config::ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn api_server(
        operation: &'static str,
        source: signet_api::ApiServerError,
    ) -> Self {
        Self::ApiServer { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: signet_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn pipeline(
        operation: &'static str,
        source: signet_pipeline::PipelineError,
    ) -> Self {
        Self::Pipeline { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn app_error_keeps_operation_and_source() {
        let err = AppError::pipeline("service.stop", signet_pipeline::PipelineError::NotRunning);
        assert_eq!(err.to_string(), "watch pipeline operation failed");
        assert!(err.source().is_some());
        assert!(matches!(
            err,
            AppError::Pipeline {
                operation: "service.stop",
                ..
            }
        ));
    }

    #[test]
    fn config_errors_are_wrapped() {
        let source = signet_config::ConfigError::Io {
            operation: "config.read",
            path: std::path::PathBuf::from("signet.yaml"),
            source: std::io::Error::other("boom"),
        };
        let err = AppError::config("config.load", source);
        assert_eq!(err.to_string(), "configuration operation failed");
    }
}
