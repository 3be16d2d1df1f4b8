//! The processing worker: one task draining the queue in FIFO order.
//!
//! # Design
//! - Per-file work sits behind [`FileHandler`]; [`DocumentPipeline`] is the
//!   production implementation.
//! - Each item runs inside a panic boundary. Errors and panics are logged,
//!   recorded as failed outcomes, and followed by a backoff pause.
//! - The in-flight guard travels with the item and is dropped once the
//!   outcome is recorded, whatever happened.
//! - The receive uses a 1s timeout and races the stop channel.

use std::any::Any;
use std::io;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::FutureExt;
use signet_config::WatchConfig;
use signet_telemetry::Metrics;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::classify::{FilenameClassifier, Verdict};
use crate::error::{PipelineError, PipelineResult};
use crate::history::OutcomeHistory;
use crate::intake::{QueueDepth, QueuedFile};
use crate::model::{
    FilenameMetadata, OutcomeStatus, PathEvent, ProcessingOutcome, has_pdf_extension,
};
use crate::mover::DestinationMover;
use crate::stability::StabilityDetector;

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);

/// Skip reason for files removed before the worker reached them.
pub const FILE_DISAPPEARED: &str = "file disappeared";
/// Skip reason for files still changing at the stability deadline.
pub const NOT_STABLE: &str = "File did not stabilize within timeout";
/// Skip reason for non-PDF names reaching the worker.
pub const NOT_PDF: &str = "Non-PDF file, skipped";

/// Turns one queued notification into an outcome.
#[async_trait]
pub trait FileHandler: Send + Sync {
    /// Process the file named by `event`.
    ///
    /// # Errors
    ///
    /// Returns an error for unexpected failures; expected dispositions
    /// (skips and move failures) come back as outcomes.
    async fn handle(&self, event: &PathEvent) -> PipelineResult<ProcessingOutcome>;
}

/// Classify, wait for stability, then move.
#[derive(Clone)]
pub struct DocumentPipeline {
    classifier: FilenameClassifier,
    detector: StabilityDetector,
    mover: DestinationMover,
    metrics: Metrics,
}

impl DocumentPipeline {
    /// Assemble a pipeline from its stages.
    #[must_use]
    pub const fn new(
        classifier: FilenameClassifier,
        detector: StabilityDetector,
        mover: DestinationMover,
        metrics: Metrics,
    ) -> Self {
        Self {
            classifier,
            detector,
            mover,
            metrics,
        }
    }

    /// Build every stage from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidPattern`] when the filename pattern is unusable.
    pub fn from_config(config: &WatchConfig, metrics: Metrics) -> PipelineResult<Self> {
        Ok(Self::new(
            FilenameClassifier::from_config(config)?,
            StabilityDetector::new(config.stability_timeout(), config.poll_interval()),
            DestinationMover::new(&config.destination_root, config.dry_run),
            metrics,
        ))
    }

    async fn relocate(
        &self,
        event: &PathEvent,
        metadata: FilenameMetadata,
        size: u64,
    ) -> PipelineResult<ProcessingOutcome> {
        let mover = self.mover.clone();
        let source = event.path.clone();
        let planned = metadata.clone();
        let moved = tokio::task::spawn_blocking(move || mover.relocate(&source, &planned))
            .await
            .map_err(|_| PipelineError::WorkerJoin { reason: "panicked" })?;

        let outcome = ProcessingOutcome::new(&event.path, OutcomeStatus::Processed)
            .with_detected_at(event.detected_at)
            .with_size(size)
            .with_metadata(metadata);
        Ok(match moved {
            Ok(destination) => outcome.with_destination(destination),
            Err(err) => {
                error!(
                    path = %event.path.display(),
                    error = %err,
                    detail = %err.detail(),
                    "failed to move document"
                );
                ProcessingOutcome {
                    status: OutcomeStatus::Failed,
                    ..outcome.with_error(err.detail())
                }
            }
        })
    }
}

#[async_trait]
impl FileHandler for DocumentPipeline {
    async fn handle(&self, event: &PathEvent) -> PipelineResult<ProcessingOutcome> {
        let path = &event.path;
        let skipped = |reason: &str| {
            ProcessingOutcome::new(path, OutcomeStatus::Skipped)
                .with_detected_at(event.detected_at)
                .with_error(reason)
        };

        if !has_pdf_extension(path) {
            return Ok(skipped(NOT_PDF));
        }
        info!(path = %path.display(), kind = event.kind.as_str(), "processing file");

        let size = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "file disappeared before processing");
                return Ok(skipped(FILE_DISAPPEARED));
            }
            Err(err) => return Err(PipelineError::io("worker.stat", path, err)),
        };

        let name = event.file_name().unwrap_or_default();
        let verdict = self.classifier.verdict(name);
        let reason = verdict.reason();
        let metadata = match verdict {
            Verdict::Signed(metadata) => metadata,
            Verdict::Unsigned(metadata) => {
                info!(path = %path.display(), status = %metadata.status, "document not signed; ignoring");
                return Ok(skipped(reason).with_size(size).with_metadata(metadata));
            }
            Verdict::NoMatch => {
                info!(path = %path.display(), "filename does not match pattern");
                return Ok(skipped(reason).with_size(size));
            }
        };
        info!(path = %path.display(), "found signed document");

        let started = Instant::now();
        let stable = self.detector.wait_for_stability(path).await;
        self.metrics.observe_stability_wait(started.elapsed());
        if !stable {
            warn!(path = %path.display(), "file did not stabilize within timeout");
            return Ok(skipped(NOT_STABLE).with_size(size).with_metadata(metadata));
        }

        let size = tokio::fs::metadata(path)
            .await
            .map_or(size, |settled| settled.len());
        self.relocate(event, metadata, size).await
    }
}

/// Everything the worker task needs besides its channels.
pub(crate) struct Worker {
    pub(crate) handler: Arc<dyn FileHandler>,
    pub(crate) history: OutcomeHistory,
    pub(crate) depth: QueueDepth,
    pub(crate) metrics: Metrics,
    pub(crate) backoff: Duration,
}

enum Step {
    Stop,
    Idle,
    Item(QueuedFile),
}

impl Worker {
    /// Drain `receiver` until stopped or the queue closes.
    pub(crate) async fn run(
        self,
        mut receiver: mpsc::UnboundedReceiver<QueuedFile>,
        mut stop: watch::Receiver<bool>,
    ) {
        info!("worker started");
        loop {
            if *stop.borrow() {
                break;
            }
            let step = tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() { Step::Stop } else { Step::Idle }
                }
                received = timeout(RECEIVE_TIMEOUT, receiver.recv()) => match received {
                    Err(_) => Step::Idle,
                    Ok(None) => Step::Stop,
                    Ok(Some(item)) => Step::Item(item),
                },
            };
            match step {
                Step::Stop => break,
                Step::Idle => {}
                Step::Item(item) => {
                    self.depth.decrement();
                    self.process(item).await;
                }
            }
        }
        info!("worker stopped");
    }

    async fn process(&self, item: QueuedFile) {
        let QueuedFile { event, guard } = item;
        debug!(path = %guard.path().display(), "dequeued file");
        let result = AssertUnwindSafe(self.handler.handle(&event))
            .catch_unwind()
            .await;

        let failure = match result {
            Ok(Ok(outcome)) => {
                self.history.record(outcome);
                None
            }
            Ok(Err(err)) => {
                error!(
                    path = %event.path.display(),
                    error = %err,
                    detail = %err.detail(),
                    "unexpected error while processing file"
                );
                Some(err.detail())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(path = %event.path.display(), panic = %message, "worker panicked while processing file");
                Some(format!("worker panicked: {message}"))
            }
        };

        if let Some(detail) = failure {
            self.metrics.inc_worker_error();
            self.history.record(
                ProcessingOutcome::new(&event.path, OutcomeStatus::Failed)
                    .with_detected_at(event.detected_at)
                    .with_error(detail),
            );
            drop(guard);
            sleep(self.backoff).await;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
