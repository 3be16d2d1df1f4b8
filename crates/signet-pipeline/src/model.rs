//! Data carriers shared by the pipeline stages, the service, and the API.
//!
//! # Design
//! - Outcomes are built once per attempt and never mutated after recording.
//! - Everything here serializes directly into API responses.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use signet_events::{OutcomeStatus, WatcherState};

/// Fields extracted from a `<doc>_<client>_<date>_<status>.pdf` filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilenameMetadata {
    /// Document type segment.
    pub doc: String,
    /// Client segment.
    pub client: String,
    /// Date segment, `YYYYMMDD` with optional dashes.
    pub date: String,
    /// Status segment.
    pub status: String,
}

/// Result of one processing attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    /// Unique outcome identifier.
    pub id: Uuid,
    /// Path the attempt started from.
    pub source_path: PathBuf,
    /// Final (or would-be, in dry run) destination.
    pub destination_path: Option<PathBuf>,
    /// Disposition of the attempt.
    pub status: OutcomeStatus,
    /// Failure or skip reason.
    pub error: Option<String>,
    /// When the file was first observed.
    pub detected_at: DateTime<Utc>,
    /// When the attempt finished.
    pub processed_at: DateTime<Utc>,
    /// File size at the time of processing, when known.
    pub size_bytes: Option<u64>,
    /// Parsed filename fields, when the name matched.
    pub metadata: Option<FilenameMetadata>,
}

impl ProcessingOutcome {
    /// Start an outcome for `source` with the given status.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>, status: OutcomeStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source_path: source.into(),
            destination_path: None,
            status,
            error: None,
            detected_at: now,
            processed_at: now,
            size_bytes: None,
            metadata: None,
        }
    }

    /// Attach the destination path.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination_path = Some(destination.into());
        self
    }

    /// Attach a failure or skip reason.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attach parsed filename metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: FilenameMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Attach the observed file size.
    #[must_use]
    pub const fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// Override the detection timestamp.
    #[must_use]
    pub const fn with_detected_at(mut self, detected_at: DateTime<Utc>) -> Self {
        self.detected_at = detected_at;
        self
    }
}

/// Kind of filesystem change that produced a [`PathEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathEventKind {
    /// A new entry appeared.
    Created,
    /// Content or metadata changed.
    Modified,
    /// An entry was renamed into place; the path is the new name.
    Moved,
}

impl PathEventKind {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Moved => "moved",
        }
    }
}

/// Filesystem notification reduced to what intake needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEvent {
    /// Affected path; for moves, the destination path.
    pub path: PathBuf,
    /// Kind of change.
    pub kind: PathEventKind,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// When the notification was received.
    pub detected_at: DateTime<Utc>,
}

impl PathEvent {
    /// Build a file event stamped with the current time.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: PathEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
            is_directory: false,
            detected_at: Utc::now(),
        }
    }

    /// Mark the event as referring to a directory.
    #[must_use]
    pub const fn directory(mut self, is_directory: bool) -> Self {
        self.is_directory = is_directory;
        self
    }

    /// File name component as UTF-8, when present.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

/// Why intake refused a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    /// The entry is a directory.
    Directory,
    /// The extension is not `.pdf`.
    NotPdf,
    /// Dotfile, typically an editor or sync artefact.
    Hidden,
    /// Partial download or editor backup (`.part`, `~`).
    Temporary,
}

impl FilterReason {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::NotPdf => "not_pdf",
            Self::Hidden => "hidden",
            Self::Temporary => "temporary",
        }
    }
}

/// Result of offering a notification to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Queued for processing.
    Admitted,
    /// Already queued or being processed; dropped.
    Duplicate,
    /// Rejected before admission.
    Filtered(FilterReason),
    /// The service is not running.
    Stopped,
}

/// Point-in-time view of the watcher for status endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    /// Lifecycle state.
    pub state: WatcherState,
    /// Seconds since the current run started; zero when not running.
    pub uptime_secs: u64,
    /// Files moved since the last reset.
    pub files_processed: u64,
    /// Files waiting in the queue.
    pub queue_size: usize,
    /// Files admitted and not yet finished.
    pub in_flight: usize,
    /// Most recent startup or processing error.
    pub last_error: Option<String>,
    /// Whether the active configuration is a dry run.
    pub dry_run: bool,
    /// Directory being watched.
    pub workplace_path: PathBuf,
    /// Root of the destination tree.
    pub destination_root: PathBuf,
}

/// Liveness of the run's moving parts, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeActivity {
    /// A filesystem watch is registered.
    pub watch_active: bool,
    /// The worker task has not exited.
    pub worker_active: bool,
}

/// One workplace file as the pipeline would treat it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewEntry {
    /// File inspected.
    pub file_path: PathBuf,
    /// Whether the worker would move it.
    pub would_process: bool,
    /// Human-readable explanation.
    pub reason: String,
    /// Parsed filename fields, when the name matched.
    pub metadata: Option<FilenameMetadata>,
    /// Planned destination for files that would be moved.
    pub destination_path: Option<PathBuf>,
}

/// Totals for a preview run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreviewSummary {
    /// Regular files inspected.
    pub total_files: usize,
    /// Files that would be moved.
    pub would_process: usize,
    /// Files that would be left alone.
    pub would_skip: usize,
    /// Files whose planned destination already exists.
    pub conflicts: usize,
}

/// Dry classification of the current workplace contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreviewReport {
    /// Per-file verdicts, sorted by path.
    pub files: Vec<PreviewEntry>,
    /// Aggregate counts.
    pub summary: PreviewSummary,
}

pub(crate) fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_builder_sets_fields() {
        let metadata = FilenameMetadata {
            doc: "contract".into(),
            client: "Acme".into(),
            date: "2024-01-15".into(),
            status: "signed".into(),
        };
        let outcome = ProcessingOutcome::new("/in/a.pdf", OutcomeStatus::Processed)
            .with_destination("/out/a.pdf")
            .with_size(42)
            .with_metadata(metadata.clone());
        assert_eq!(outcome.destination_path, Some(PathBuf::from("/out/a.pdf")));
        assert_eq!(outcome.size_bytes, Some(42));
        assert_eq!(outcome.metadata, Some(metadata));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn outcome_serializes_status_lowercase() -> Result<(), serde_json::Error> {
        let outcome = ProcessingOutcome::new("/in/a.pdf", OutcomeStatus::Skipped)
            .with_error("Filename doesn't match pattern");
        let value = serde_json::to_value(&outcome)?;
        assert_eq!(value["status"], "skipped");
        assert_eq!(value["source_path"], "/in/a.pdf");
        Ok(())
    }

    #[test]
    fn pdf_extension_is_case_insensitive() {
        assert!(has_pdf_extension(Path::new("/in/A.PDF")));
        assert!(has_pdf_extension(Path::new("b.pdf")));
        assert!(!has_pdf_extension(Path::new("c.pdf.part")));
        assert!(!has_pdf_extension(Path::new("noext")));
    }
}
