//! Notification filtering, in-flight deduplication, and the work queue.
//!
//! # Design
//! - Filtering happens before admission so the queue only ever holds PDFs.
//! - Admission is one insert-if-absent under a single mutex.
//! - Each queued item carries an [`InFlightGuard`]; dropping it (after
//!   processing, on panic, or when the queue is discarded) frees the path.
//! - Guards hold a ticket so a stale guard never frees a re-admitted path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use signet_events::{Event, EventBus};
use signet_telemetry::Metrics;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::history::publish_event;
use crate::model::{FilterReason, PathEvent, SubmitOutcome, has_pdf_extension};

/// Decide whether a notification should reach the queue.
///
/// # Errors
///
/// Returns the [`FilterReason`] for directories, non-PDF names, dotfiles,
/// and partial or backup files.
pub fn admissible(event: &PathEvent) -> Result<(), FilterReason> {
    if event.is_directory {
        return Err(FilterReason::Directory);
    }
    let name = event.file_name().unwrap_or_default();
    if name.starts_with('.') {
        return Err(FilterReason::Hidden);
    }
    if name.ends_with(".part") || name.ends_with('~') {
        return Err(FilterReason::Temporary);
    }
    if !has_pdf_extension(&event.path) {
        return Err(FilterReason::NotPdf);
    }
    Ok(())
}

/// Paths admitted to the queue and not yet released.
#[derive(Clone)]
pub struct InFlightSet {
    inner: Arc<InFlightInner>,
}

struct InFlightInner {
    paths: Mutex<HashMap<PathBuf, u64>>,
    next_ticket: AtomicU64,
    metrics: Metrics,
}

impl InFlightSet {
    /// Empty set reporting its size through `metrics`.
    #[must_use]
    pub fn new(metrics: Metrics) -> Self {
        Self {
            inner: Arc::new(InFlightInner {
                paths: Mutex::new(HashMap::new()),
                next_ticket: AtomicU64::new(1),
                metrics,
            }),
        }
    }

    /// Claim `path`, or `None` when it is already in flight.
    #[must_use]
    pub fn try_admit(&self, path: &Path) -> Option<InFlightGuard> {
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);
        let mut paths = self.lock();
        if paths.contains_key(path) {
            return None;
        }
        paths.insert(path.to_path_buf(), ticket);
        self.inner.metrics.set_in_flight(paths.len());
        drop(paths);
        Some(InFlightGuard {
            set: self.clone(),
            path: path.to_path_buf(),
            ticket,
        })
    }

    /// Whether `path` is currently claimed.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    /// Number of claimed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no path is claimed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget every claim. Outstanding guards become no-ops.
    pub fn clear(&self) {
        let mut paths = self.lock();
        paths.clear();
        self.inner.metrics.set_in_flight(0);
    }

    fn release(&self, path: &Path, ticket: u64) {
        let mut paths = self.lock();
        if paths.get(path) == Some(&ticket) {
            paths.remove(path);
            self.inner.metrics.set_in_flight(paths.len());
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, u64>> {
        match self.inner.paths.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("in-flight mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        }
    }
}

/// Claim on one in-flight path, released on drop.
pub struct InFlightGuard {
    set: InFlightSet,
    path: PathBuf,
    ticket: u64,
}

impl InFlightGuard {
    /// Claimed path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.release(&self.path, self.ticket);
    }
}

/// Item handed from intake to the worker.
pub(crate) struct QueuedFile {
    pub(crate) event: PathEvent,
    pub(crate) guard: InFlightGuard,
}

/// Shared count of queued, not yet dequeued, items.
#[derive(Clone)]
pub(crate) struct QueueDepth {
    depth: Arc<AtomicUsize>,
    metrics: Metrics,
}

impl QueueDepth {
    pub(crate) fn new(metrics: Metrics) -> Self {
        Self {
            depth: Arc::new(AtomicUsize::new(0)),
            metrics,
        }
    }

    pub(crate) fn get(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    pub(crate) fn increment(&self) -> usize {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        self.metrics.set_queue_depth(depth);
        depth
    }

    pub(crate) fn decrement(&self) -> usize {
        let previous = self
            .depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |value| {
                Some(value.saturating_sub(1))
            })
            .unwrap_or_default();
        let depth = previous.saturating_sub(1);
        self.metrics.set_queue_depth(depth);
        depth
    }

    pub(crate) fn reset(&self) {
        self.depth.store(0, Ordering::SeqCst);
        self.metrics.set_queue_depth(0);
    }
}

/// Entry point for notifications: filter, dedup, enqueue.
#[derive(Clone)]
pub struct Intake {
    in_flight: InFlightSet,
    sender: mpsc::UnboundedSender<QueuedFile>,
    depth: QueueDepth,
    events: EventBus,
    metrics: Metrics,
}

impl Intake {
    pub(crate) fn channel(
        in_flight: InFlightSet,
        depth: QueueDepth,
        events: EventBus,
        metrics: Metrics,
    ) -> (Self, mpsc::UnboundedReceiver<QueuedFile>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                in_flight,
                sender,
                depth,
                events,
                metrics,
            },
            receiver,
        )
    }

    /// Offer a notification to the queue.
    pub fn submit(&self, event: PathEvent) -> SubmitOutcome {
        if let Err(reason) = admissible(&event) {
            debug!(
                path = %event.path.display(),
                kind = event.kind.as_str(),
                reason = reason.as_str(),
                "notification filtered"
            );
            return SubmitOutcome::Filtered(reason);
        }
        let Some(guard) = self.in_flight.try_admit(&event.path) else {
            debug!(path = %event.path.display(), "path already in flight; dropping notification");
            return SubmitOutcome::Duplicate;
        };

        let path = event.path.display().to_string();
        let queue_depth = self.depth.increment();
        if self.sender.send(QueuedFile { event, guard }).is_err() {
            self.depth.decrement();
            return SubmitOutcome::Stopped;
        }
        debug!(path = %path, queue_depth, "file queued");
        publish_event(
            &self.events,
            &self.metrics,
            Event::FileQueued { path, queue_depth },
        );
        SubmitOutcome::Admitted
    }

    /// Whether the worker side of the queue has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PathEventKind;

    fn metrics() -> anyhow::Result<Metrics> {
        Ok(Metrics::new()?)
    }

    #[test]
    fn filters_non_documents() {
        let cases = [
            (PathEvent::new("/in/dir", PathEventKind::Created).directory(true), FilterReason::Directory),
            (PathEvent::new("/in/.hidden.pdf", PathEventKind::Created), FilterReason::Hidden),
            (PathEvent::new("/in/a.pdf.part", PathEventKind::Modified), FilterReason::Temporary),
            (PathEvent::new("/in/a.pdf~", PathEventKind::Modified), FilterReason::Temporary),
            (PathEvent::new("/in/notes.txt", PathEventKind::Created), FilterReason::NotPdf),
        ];
        for (event, reason) in cases {
            assert_eq!(admissible(&event), Err(reason), "{}", event.path.display());
        }
        assert!(admissible(&PathEvent::new("/in/A.PDF", PathEventKind::Moved)).is_ok());
    }

    #[test]
    fn in_flight_admits_once_and_releases_on_drop() -> anyhow::Result<()> {
        let set = InFlightSet::new(metrics()?);
        let path = Path::new("/in/a.pdf");
        let guard = set.try_admit(path);
        assert!(guard.is_some());
        assert!(set.try_admit(path).is_none());
        assert_eq!(set.len(), 1);
        drop(guard);
        assert!(set.is_empty());
        assert!(set.try_admit(path).is_some());
        Ok(())
    }

    #[test]
    fn stale_guard_does_not_release_readmitted_path() -> anyhow::Result<()> {
        let set = InFlightSet::new(metrics()?);
        let path = Path::new("/in/a.pdf");
        let stale = set.try_admit(path);
        set.clear();
        let fresh = set.try_admit(path);
        assert!(fresh.is_some());
        drop(stale);
        assert!(set.contains(path));
        drop(fresh);
        assert!(!set.contains(path));
        Ok(())
    }

    #[tokio::test]
    async fn submit_deduplicates_until_processed() -> anyhow::Result<()> {
        let metrics = metrics()?;
        let events = EventBus::new();
        let set = InFlightSet::new(metrics.clone());
        let depth = QueueDepth::new(metrics.clone());
        let (intake, mut receiver) =
            Intake::channel(set.clone(), depth.clone(), events.clone(), metrics);

        let event = PathEvent::new("/in/contract_Acme_2024-01-15_signed.pdf", PathEventKind::Created);
        assert_eq!(intake.submit(event.clone()), SubmitOutcome::Admitted);
        assert_eq!(intake.submit(event.clone()), SubmitOutcome::Duplicate);
        assert_eq!(
            intake.submit(PathEvent::new("/in/readme.txt", PathEventKind::Created)),
            SubmitOutcome::Filtered(FilterReason::NotPdf)
        );
        assert_eq!(depth.get(), 1);

        let queued = receiver.recv().await;
        assert!(queued.is_some());
        drop(queued);
        assert!(set.is_empty());
        assert_eq!(intake.submit(event), SubmitOutcome::Admitted);

        let mut stream = events.subscribe(Some(0));
        let first = stream.next().await;
        assert!(matches!(
            first.map(|envelope| envelope.event),
            Some(Event::FileQueued { queue_depth: 1, .. })
        ));
        Ok(())
    }

    #[test]
    fn submit_after_receiver_drop_reports_stopped() -> anyhow::Result<()> {
        let metrics = metrics()?;
        let set = InFlightSet::new(metrics.clone());
        let depth = QueueDepth::new(metrics.clone());
        let (intake, receiver) = Intake::channel(set.clone(), depth.clone(), EventBus::new(), metrics);
        drop(receiver);
        assert!(intake.is_closed());
        let outcome = intake.submit(PathEvent::new("/in/a.pdf", PathEventKind::Created));
        assert_eq!(outcome, SubmitOutcome::Stopped);
        assert!(set.is_empty());
        assert_eq!(depth.get(), 0);
        Ok(())
    }
}
