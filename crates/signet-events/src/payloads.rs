//! Event payloads and envelope metadata.
//!
//! # Design
//! - Payloads carry plain strings and identifiers so consumers never depend on pipeline types.
//! - `kind()` is the stable discriminator shared by SSE clients and metrics labels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier assigned to each event emitted by the watcher.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub(crate) const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

/// Typed domain events surfaced across the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A path passed intake filtering and was queued for processing.
    FileQueued {
        /// Absolute path admitted to the work queue.
        path: String,
        /// Queue depth immediately after admission.
        queue_depth: usize,
    },
    /// A processing attempt finished and its outcome was recorded.
    FileOutcome {
        /// Identifier of the recorded outcome.
        outcome_id: Uuid,
        /// Path the attempt started from.
        source_path: String,
        /// Final (or would-be, in dry run) destination.
        destination_path: Option<String>,
        /// Disposition of the attempt.
        status: OutcomeStatus,
        /// Failure or skip reason when available.
        error: Option<String>,
    },
    /// The watcher lifecycle moved to a new state.
    WatcherStateChanged {
        /// State after the transition.
        state: WatcherState,
        /// Optional detail (e.g. the startup failure).
        detail: Option<String>,
    },
    /// A configuration update was accepted and awaits a restart.
    ConfigStaged {
        /// Human-readable summary of the staged change.
        description: String,
    },
    /// Degraded components changed.
    HealthChanged {
        /// Components currently degraded; empty when healthy.
        degraded: Vec<String>,
    },
}

impl Event {
    /// Machine-friendly discriminator for SSE consumers.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::FileQueued { .. } => "file_queued",
            Self::FileOutcome { .. } => "file_outcome",
            Self::WatcherStateChanged { .. } => "watcher_state_changed",
            Self::ConfigStaged { .. } => "config_staged",
            Self::HealthChanged { .. } => "health_changed",
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier assigned by the bus.
    pub id: EventId,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
    /// Event payload.
    pub event: Event,
}

/// Disposition of a single processing attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The document was moved (or would have been, in dry run).
    Processed,
    /// The attempt failed; the source is left in place.
    Failed,
    /// The file was intentionally left alone.
    Skipped,
}

impl OutcomeStatus {
    /// Render the status as its lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Lifecycle of the watcher service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WatcherState {
    /// No watch or worker is active.
    #[default]
    Stopped,
    /// Directories and the watch are being prepared.
    Starting,
    /// Watching and processing.
    Running,
    /// The last start attempt failed.
    Error,
}

impl WatcherState {
    /// Render the state as its lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_type_tag() -> Result<(), serde_json::Error> {
        let event = Event::WatcherStateChanged {
            state: WatcherState::Running,
            detail: None,
        };
        let value = serde_json::to_value(&event)?;
        assert_eq!(value["type"], "watcher_state_changed");
        assert_eq!(value["state"], "running");
        assert_eq!(event.kind(), "watcher_state_changed");
        Ok(())
    }

    #[test]
    fn outcome_status_labels_match_serde() -> Result<(), serde_json::Error> {
        for status in [
            OutcomeStatus::Processed,
            OutcomeStatus::Failed,
            OutcomeStatus::Skipped,
        ] {
            let rendered = serde_json::to_value(status)?;
            assert_eq!(rendered, status.as_str());
        }
        Ok(())
    }
}
