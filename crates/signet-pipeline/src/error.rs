//! # Design
//!
//! - Structured, constant-message errors for the processing pipeline.
//! - Operation and path context live in fields so failures stay reproducible.

use std::io;
use std::path::{Path, PathBuf};

use signet_config::ConfigError;
use thiserror::Error;

/// Result alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors produced by the watcher pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Filesystem interaction failed.
    #[error("pipeline io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The filename pattern could not be compiled or lacks required groups.
    #[error("invalid filename pattern")]
    InvalidPattern {
        /// Pattern that was rejected.
        pattern: String,
        /// Machine-readable reason.
        reason: &'static str,
    },
    /// The filesystem watch could not be established.
    #[error("filesystem watch failure")]
    Watch {
        /// Directory being watched.
        path: PathBuf,
        /// Underlying notify error.
        source: notify::Error,
    },
    /// `start` was called on a running service.
    #[error("watcher already running")]
    AlreadyRunning,
    /// `stop` was called on a stopped service.
    #[error("watcher not running")]
    NotRunning,
    /// The worker task could not be joined cleanly.
    #[error("worker task join failure")]
    WorkerJoin {
        /// Machine-readable reason (`panicked`, `timeout`).
        reason: &'static str,
    },
    /// Configuration was rejected.
    #[error("pipeline configuration rejected")]
    Config {
        /// Underlying configuration error.
        #[from]
        source: ConfigError,
    },
}

impl PipelineError {
    pub(crate) fn io(operation: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Human-readable detail combining the message with its context.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Io {
                operation,
                path,
                source,
            } => format!("{operation} failed for {}: {source}", path.display()),
            Self::InvalidPattern { pattern, reason } => format!("{reason}: {pattern}"),
            Self::Watch { path, source } => {
                format!("cannot watch {}: {source}", path.display())
            }
            Self::Config { source } => match (source.field(), source.reason()) {
                (Some(field), Some(reason)) => format!("{field}: {reason}"),
                _ => source.to_string(),
            },
            Self::AlreadyRunning | Self::NotRunning | Self::WorkerJoin { .. } => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn io_helper_keeps_context() {
        let err = PipelineError::io("mover.rename", "/tmp/a.pdf", io::Error::other("boom"));
        assert_eq!(err.to_string(), "pipeline io failure");
        assert!(err.source().is_some());
        assert_eq!(err.detail(), "mover.rename failed for /tmp/a.pdf: boom");
    }

    #[test]
    fn lifecycle_errors_render_constant_messages() {
        assert_eq!(PipelineError::AlreadyRunning.detail(), "watcher already running");
        assert_eq!(PipelineError::NotRunning.to_string(), "watcher not running");
    }
}
