//! Lifecycle facade owning the watch, the worker, and the shared state.
//!
//! # Design
//! - One mutex guards the lifecycle (state, active and pending config, the
//!   running watch/worker pair); it is never held across an await.
//! - A run works from an immutable `Arc<WatchConfig>` snapshot. Config
//!   changes are staged and picked up by the next `start`.
//! - The watch callback holds only an [`Intake`] clone, never the service.
//! - `stop` joins the worker with a bound; a worker stuck in a move is
//!   detached rather than aborted.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use signet_config::{WatchConfig, WatchConfigPatch, validate_watch_config};
use signet_events::{Event, EventBus, WatcherState};
use signet_telemetry::Metrics;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::classify::{FilenameClassifier, Verdict};
use crate::error::{PipelineError, PipelineResult};
use crate::history::{OutcomeHistory, publish_event};
use crate::intake::{InFlightSet, Intake, QueueDepth};
use crate::model::{
    PathEvent, PathEventKind, PreviewEntry, PreviewReport, ProcessingOutcome, RuntimeActivity,
    ServiceStatus, SubmitOutcome, has_pdf_extension,
};
use crate::mover::DestinationMover;
use crate::watch::{NotifyWatchSource, PathEventSink, PathEventSource, WatchHandle};
use crate::worker::{DocumentPipeline, NOT_PDF, Worker};

const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(5);
const HEALTH_COMPONENT: &str = "watcher";

/// Owns the processing pipeline and its lifecycle.
#[derive(Clone)]
pub struct WatchService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    lifecycle: Mutex<Lifecycle>,
    history: OutcomeHistory,
    in_flight: InFlightSet,
    depth: QueueDepth,
    events: EventBus,
    metrics: Metrics,
    source: Arc<dyn PathEventSource>,
}

struct Lifecycle {
    state: WatcherState,
    started_at: Option<Instant>,
    last_error: Option<String>,
    degraded: bool,
    config: Arc<WatchConfig>,
    pending: Option<Arc<WatchConfig>>,
    running: Option<RunningPipeline>,
}

struct RunningPipeline {
    intake: Intake,
    stop: watch::Sender<bool>,
    worker: JoinHandle<()>,
    watch: WatchHandle,
}

impl WatchService {
    /// Service watching through the platform's `notify` backend.
    #[must_use]
    pub fn new(config: WatchConfig, events: EventBus, metrics: Metrics) -> Self {
        Self::with_source(config, events, metrics, Arc::new(NotifyWatchSource))
    }

    /// Service using a caller-supplied notification source.
    #[must_use]
    pub fn with_source(
        config: WatchConfig,
        events: EventBus,
        metrics: Metrics,
        source: Arc<dyn PathEventSource>,
    ) -> Self {
        let history = OutcomeHistory::new(config.history_capacity, events.clone(), metrics.clone());
        Self {
            inner: Arc::new(ServiceInner {
                lifecycle: Mutex::new(Lifecycle {
                    state: WatcherState::Stopped,
                    started_at: None,
                    last_error: None,
                    degraded: false,
                    config: Arc::new(config),
                    pending: None,
                    running: None,
                }),
                history,
                in_flight: InFlightSet::new(metrics.clone()),
                depth: QueueDepth::new(metrics.clone()),
                events,
                metrics,
                source,
            }),
        }
    }

    /// Prepare directories, start the watch, and spawn the worker.
    ///
    /// A staged configuration becomes active here. When
    /// `process_existing` is set, PDFs already in the workplace are queued.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::AlreadyRunning`] when a run is active, or the
    /// startup failure; in that case the state becomes `error`.
    pub async fn start(&self) -> PipelineResult<()> {
        let config = {
            let mut lifecycle = self.lock();
            if matches!(
                lifecycle.state,
                WatcherState::Running | WatcherState::Starting
            ) {
                return Err(PipelineError::AlreadyRunning);
            }
            if let Some(pending) = lifecycle.pending.take() {
                lifecycle.config = pending;
            }
            lifecycle.state = WatcherState::Starting;
            Arc::clone(&lifecycle.config)
        };
        self.publish_state(WatcherState::Starting, None);

        match self.launch(&config) {
            Ok(running) => {
                let recovered = {
                    let mut lifecycle = self.lock();
                    lifecycle.running = Some(running);
                    lifecycle.state = WatcherState::Running;
                    lifecycle.started_at = Some(Instant::now());
                    lifecycle.last_error = None;
                    std::mem::take(&mut lifecycle.degraded)
                };
                info!(
                    workplace = %config.workplace_path.display(),
                    destination = %config.destination_root.display(),
                    dry_run = config.dry_run,
                    "watcher started"
                );
                self.publish_state(WatcherState::Running, None);
                if recovered {
                    self.publish(Event::HealthChanged { degraded: vec![] });
                }
                if config.process_existing {
                    match self.scan_existing().await {
                        Ok(queued) => info!(queued, "queued existing files"),
                        Err(err) => warn!(error = %err, detail = %err.detail(), "failed to scan existing files"),
                    }
                }
                Ok(())
            }
            Err(err) => {
                let detail = err.detail();
                let newly_degraded = {
                    let mut lifecycle = self.lock();
                    lifecycle.state = WatcherState::Error;
                    lifecycle.started_at = None;
                    lifecycle.last_error = Some(detail.clone());
                    !std::mem::replace(&mut lifecycle.degraded, true)
                };
                error!(error = %err, detail = %detail, "watcher failed to start");
                self.publish_state(WatcherState::Error, Some(detail));
                if newly_degraded {
                    self.publish(Event::HealthChanged {
                        degraded: vec![HEALTH_COMPONENT.to_string()],
                    });
                }
                Err(err)
            }
        }
    }

    fn launch(&self, config: &Arc<WatchConfig>) -> PipelineResult<RunningPipeline> {
        validate_watch_config(config)?;
        fs::create_dir_all(&config.workplace_path).map_err(|err| {
            PipelineError::io("service.create_workplace", &config.workplace_path, err)
        })?;
        if !config.workplace_path.is_dir() {
            return Err(PipelineError::io(
                "service.create_workplace",
                &config.workplace_path,
                std::io::Error::new(std::io::ErrorKind::NotADirectory, "workplace is not a directory"),
            ));
        }
        if !config.dry_run {
            fs::create_dir_all(&config.destination_root).map_err(|err| {
                PipelineError::io("service.create_destination", &config.destination_root, err)
            })?;
        }
        let handler = DocumentPipeline::from_config(config, self.inner.metrics.clone())?;
        self.inner.history.set_capacity(config.history_capacity);

        self.inner.in_flight.clear();
        self.inner.depth.reset();
        let (intake, receiver) = Intake::channel(
            self.inner.in_flight.clone(),
            self.inner.depth.clone(),
            self.inner.events.clone(),
            self.inner.metrics.clone(),
        );
        let sink: PathEventSink = {
            let intake = intake.clone();
            Arc::new(move |event: PathEvent| {
                let _ = intake.submit(event);
            })
        };
        let watch = self.inner.source.watch(&config.workplace_path, sink)?;

        let (stop, stop_rx) = watch::channel(false);
        let worker = Worker {
            handler: Arc::new(handler),
            history: self.inner.history.clone(),
            depth: self.inner.depth.clone(),
            metrics: self.inner.metrics.clone(),
            backoff: config.error_backoff(),
        };
        let worker = tokio::spawn(worker.run(receiver, stop_rx));
        Ok(RunningPipeline {
            intake,
            stop,
            worker,
            watch,
        })
    }

    /// Stop watching, join the worker, and release every in-flight path.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NotRunning`] when nothing is running.
    pub async fn stop(&self) -> PipelineResult<()> {
        let running = {
            let mut lifecycle = self.lock();
            if lifecycle.state != WatcherState::Running {
                return Err(PipelineError::NotRunning);
            }
            let Some(running) = lifecycle.running.take() else {
                return Err(PipelineError::NotRunning);
            };
            lifecycle.state = WatcherState::Stopped;
            lifecycle.started_at = None;
            running
        };

        let RunningPipeline {
            intake,
            stop,
            worker,
            watch,
        } = running;
        let _ = stop.send(true);
        watch.stop();
        drop(intake);

        match timeout(STOP_JOIN_TIMEOUT, worker).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "worker task ended abnormally"),
            Err(_) => {
                warn!(
                    timeout_secs = STOP_JOIN_TIMEOUT.as_secs(),
                    "worker did not stop in time; detaching"
                );
                self.lock().last_error = Some("worker did not stop within timeout".to_string());
            }
        }
        self.inner.in_flight.clear();
        self.inner.depth.reset();
        info!("watcher stopped");
        self.publish_state(WatcherState::Stopped, None);
        Ok(())
    }

    /// Offer a path to the running pipeline.
    #[must_use]
    pub fn submit(&self, path: impl AsRef<Path>, kind: PathEventKind) -> SubmitOutcome {
        self.submit_event(PathEvent::new(path.as_ref(), kind))
    }

    /// Offer a prepared notification to the running pipeline.
    #[must_use]
    pub fn submit_event(&self, event: PathEvent) -> SubmitOutcome {
        let intake = self
            .lock()
            .running
            .as_ref()
            .map(|running| running.intake.clone());
        intake.map_or(SubmitOutcome::Stopped, |intake| intake.submit(event))
    }

    /// Queue every PDF already in the workplace as a `created` event.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] when the workplace cannot be listed.
    pub async fn scan_existing(&self) -> PipelineResult<usize> {
        let workplace = self.config().workplace_path.clone();
        let mut entries = tokio::fs::read_dir(&workplace)
            .await
            .map_err(|err| PipelineError::io("service.scan", &workplace, err))?;
        let mut queued = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| PipelineError::io("service.scan", &workplace, err))?
        {
            let is_file = entry.file_type().await.is_ok_and(|kind| kind.is_file());
            if !is_file || !has_pdf_extension(&entry.path()) {
                continue;
            }
            if self.submit(entry.path(), PathEventKind::Created) == SubmitOutcome::Admitted {
                queued += 1;
            }
        }
        Ok(queued)
    }

    /// Up to `limit` outcomes, newest first.
    #[must_use]
    pub fn recent_outcomes(&self, limit: usize) -> Vec<ProcessingOutcome> {
        self.inner.history.recent(limit)
    }

    /// Number of outcomes currently retained.
    #[must_use]
    pub fn retained_outcomes(&self) -> usize {
        self.inner.history.len()
    }

    /// Files waiting in the queue.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.inner.depth.get()
    }

    /// Files moved since start-up or the last reset.
    #[must_use]
    pub fn processed_count(&self) -> u64 {
        self.inner.history.processed_count()
    }

    /// Paths admitted and not yet finished.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> WatcherState {
        self.lock().state
    }

    /// Whether a run is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == WatcherState::Running
    }

    /// Whether the filesystem watch and the worker task are alive.
    #[must_use]
    pub fn activity(&self) -> RuntimeActivity {
        let lifecycle = self.lock();
        lifecycle
            .running
            .as_ref()
            .map_or_else(RuntimeActivity::default, |running| RuntimeActivity {
                watch_active: true,
                worker_active: !running.worker.is_finished(),
            })
    }

    /// Consistent snapshot for status endpoints.
    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        let lifecycle = self.lock();
        ServiceStatus {
            state: lifecycle.state,
            uptime_secs: lifecycle
                .started_at
                .map_or(0, |started| started.elapsed().as_secs()),
            files_processed: self.inner.history.processed_count(),
            queue_size: self.inner.depth.get(),
            in_flight: self.inner.in_flight.len(),
            last_error: lifecycle
                .last_error
                .clone()
                .or_else(|| self.inner.history.last_error()),
            dry_run: lifecycle.config.dry_run,
            workplace_path: lifecycle.config.workplace_path.clone(),
            destination_root: lifecycle.config.destination_root.clone(),
        }
    }

    /// Stop if running, then clear history, counters, queue, and errors.
    ///
    /// # Errors
    ///
    /// Propagates unexpected failures from [`WatchService::stop`].
    pub async fn force_reset(&self) -> PipelineResult<()> {
        match self.stop().await {
            Ok(()) | Err(PipelineError::NotRunning) => {}
            Err(err) => return Err(err),
        }
        self.inner.history.reset();
        self.inner.in_flight.clear();
        self.inner.depth.reset();
        let recovered = {
            let mut lifecycle = self.lock();
            lifecycle.state = WatcherState::Stopped;
            lifecycle.last_error = None;
            std::mem::take(&mut lifecycle.degraded)
        };
        info!("watcher state reset");
        self.publish_state(WatcherState::Stopped, Some("reset".to_string()));
        if recovered {
            self.publish(Event::HealthChanged { degraded: vec![] });
        }
        Ok(())
    }

    /// Classify the workplace contents without touching anything.
    ///
    /// # Errors
    ///
    /// Returns an error when the pattern is unusable or the workplace cannot be listed.
    pub async fn preview(&self) -> PipelineResult<PreviewReport> {
        let config = self.config();
        let classifier = FilenameClassifier::from_config(&config)?;
        let mover = DestinationMover::new(&config.destination_root, true);
        let workplace = &config.workplace_path;

        let mut entries = tokio::fs::read_dir(workplace)
            .await
            .map_err(|err| PipelineError::io("service.preview", workplace, err))?;
        let mut report = PreviewReport::default();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| PipelineError::io("service.preview", workplace, err))?
        {
            if !entry.file_type().await.is_ok_and(|kind| kind.is_file()) {
                continue;
            }
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            report.summary.total_files += 1;

            if !has_pdf_extension(&path) {
                report.summary.would_skip += 1;
                report.files.push(PreviewEntry {
                    file_path: path,
                    would_process: false,
                    reason: NOT_PDF.to_string(),
                    metadata: None,
                    destination_path: None,
                });
                continue;
            }

            let verdict = classifier.verdict(&name);
            let destination_path = match &verdict {
                Verdict::Signed(metadata) => {
                    if mover.destination_dir(metadata).join(&name).exists() {
                        report.summary.conflicts += 1;
                    }
                    Some(mover.plan(&path, metadata)?)
                }
                Verdict::Unsigned(_) | Verdict::NoMatch => None,
            };
            if verdict.is_signed() {
                report.summary.would_process += 1;
            } else {
                report.summary.would_skip += 1;
            }
            report.files.push(PreviewEntry {
                file_path: path,
                would_process: verdict.is_signed(),
                reason: verdict.reason().to_string(),
                metadata: verdict.metadata().cloned(),
                destination_path,
            });
        }
        report.files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        Ok(report)
    }

    /// Validate `patch` against the latest configuration and stage it for the next start.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the merged configuration is invalid.
    pub fn stage_config(&self, patch: &WatchConfigPatch) -> PipelineResult<Arc<WatchConfig>> {
        let staged = {
            let mut lifecycle = self.lock();
            let base = lifecycle
                .pending
                .clone()
                .unwrap_or_else(|| Arc::clone(&lifecycle.config));
            let next = Arc::new(patch.apply_to(&base)?);
            lifecycle.pending = Some(Arc::clone(&next));
            next
        };
        let description = format!("changed: {}", patch.changed_fields().join(", "));
        info!(fields = %description, "configuration staged for next start");
        self.publish(Event::ConfigStaged { description });
        Ok(staged)
    }

    /// Configuration used by the current (or most recent) run.
    #[must_use]
    pub fn config(&self) -> Arc<WatchConfig> {
        Arc::clone(&self.lock().config)
    }

    /// Configuration waiting for the next start, if any.
    #[must_use]
    pub fn pending_config(&self) -> Option<Arc<WatchConfig>> {
        self.lock().pending.clone()
    }

    /// Bus carrying this service's events.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Metrics registry shared with the pipeline.
    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    fn publish_state(&self, state: WatcherState, detail: Option<String>) {
        self.publish(Event::WatcherStateChanged { state, detail });
    }

    fn publish(&self, event: Event) {
        publish_event(&self.inner.events, &self.inner.metrics, event);
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        match self.inner.lifecycle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("watcher lifecycle mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutcomeStatus;
    use signet_test_support::{WatchFixture, wait_until};
    use std::sync::Mutex as StdMutex;

    /// Source that hands its sink to the test instead of watching anything.
    #[derive(Default)]
    struct ManualSource {
        sink: StdMutex<Option<PathEventSink>>,
    }

    impl ManualSource {
        fn emit(&self, event: PathEvent) -> bool {
            let sink = self.sink.lock().ok().and_then(|guard| guard.clone());
            sink.map(|sink| sink(event)).is_some()
        }
    }

    impl PathEventSource for ManualSource {
        fn watch(&self, dir: &Path, sink: PathEventSink) -> PipelineResult<WatchHandle> {
            if let Ok(mut guard) = self.sink.lock() {
                *guard = Some(sink);
            }
            Ok(WatchHandle::new(dir, ()))
        }
    }

    fn service(config: WatchConfig) -> anyhow::Result<(WatchService, Arc<ManualSource>)> {
        let source = Arc::new(ManualSource::default());
        let service = WatchService::with_source(
            config,
            EventBus::new(),
            Metrics::new()?,
            Arc::clone(&source) as Arc<dyn PathEventSource>,
        );
        Ok((service, source))
    }

    #[tokio::test]
    async fn lifecycle_conflicts_are_reported() -> anyhow::Result<()> {
        let fixture = WatchFixture::new()?;
        let (service, _) = service(fixture.watch_config())?;

        assert!(matches!(service.stop().await, Err(PipelineError::NotRunning)));
        assert_eq!(service.activity(), RuntimeActivity::default());
        service.start().await?;
        assert!(service.is_running());
        assert_eq!(
            service.activity(),
            RuntimeActivity {
                watch_active: true,
                worker_active: true,
            }
        );
        assert!(matches!(service.start().await, Err(PipelineError::AlreadyRunning)));
        service.stop().await?;
        assert_eq!(service.state(), WatcherState::Stopped);
        assert!(!service.activity().watch_active);
        assert!(matches!(service.stop().await, Err(PipelineError::NotRunning)));
        Ok(())
    }

    #[tokio::test]
    async fn startup_failure_sets_error_state() -> anyhow::Result<()> {
        let fixture = WatchFixture::new()?;
        let blocker = fixture.root().join("not-a-dir");
        fs::write(&blocker, b"file")?;
        let config = WatchConfig {
            workplace_path: blocker,
            ..fixture.watch_config()
        };
        let (service, _) = service(config)?;
        let mut stream = service.events().subscribe(None);

        assert!(service.start().await.is_err());
        let status = service.status();
        assert_eq!(status.state, WatcherState::Error);
        assert!(status.last_error.is_some());

        let mut saw_degraded = false;
        while let Ok(Some(envelope)) =
            timeout(Duration::from_millis(100), stream.next()).await
        {
            if let Event::HealthChanged { degraded } = envelope.event {
                saw_degraded = degraded == vec![HEALTH_COMPONENT.to_string()];
            }
        }
        assert!(saw_degraded);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_notifications_yield_one_outcome() -> anyhow::Result<()> {
        let fixture = WatchFixture::new()?;
        let (service, source) = service(fixture.watch_config())?;
        assert_eq!(
            service.submit(fixture.workplace().join("a.pdf"), PathEventKind::Created),
            SubmitOutcome::Stopped
        );

        service.start().await?;
        let name = "contract_Acme_2024-01-15_signed.pdf";
        let path = fixture.write_pdf(name)?;
        assert!(source.emit(PathEvent::new(&path, PathEventKind::Created)));
        assert!(source.emit(PathEvent::new(&path, PathEventKind::Modified)));

        assert!(wait_until(Duration::from_secs(5), || service.processed_count() == 1).await);
        assert!(wait_until(Duration::from_secs(1), || service.in_flight_count() == 0).await);
        assert_eq!(service.retained_outcomes(), 1);
        let outcome = service.recent_outcomes(10).remove(0);
        assert_eq!(outcome.status, OutcomeStatus::Processed);
        assert!(
            fixture
                .expected_destination(["contract", "Acme", "2024-01-15", "signed"], name)
                .is_file()
        );
        service.stop().await?;
        Ok(())
    }

    #[tokio::test]
    async fn stop_releases_in_flight_paths_within_bound() -> anyhow::Result<()> {
        let fixture = WatchFixture::new()?;
        let config = WatchConfig {
            stability_timeout_secs: 1.0,
            ..fixture.watch_config()
        };
        let (service, _) = service(config)?;
        service.start().await?;

        let path = fixture.workplace().join("contract_Acme_2024-01-15_signed.pdf");
        fs::write(&path, b"")?;
        assert_eq!(service.submit(&path, PathEventKind::Created), SubmitOutcome::Admitted);
        assert!(wait_until(Duration::from_secs(2), || service.queue_depth() == 0).await);

        let started = Instant::now();
        service.stop().await?;
        assert!(started.elapsed() < STOP_JOIN_TIMEOUT);
        assert_eq!(service.in_flight_count(), 0);
        assert_eq!(service.queue_depth(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn staged_config_applies_on_next_start() -> anyhow::Result<()> {
        let fixture = WatchFixture::new()?;
        let (service, _) = service(fixture.watch_config())?;
        service.start().await?;

        let patch = WatchConfigPatch {
            dry_run: Some(true),
            ..WatchConfigPatch::default()
        };
        let staged = service.stage_config(&patch)?;
        assert!(staged.dry_run);
        assert!(!service.config().dry_run);
        assert!(service.pending_config().is_some());

        service.stop().await?;
        service.start().await?;
        assert!(service.config().dry_run);
        assert!(service.pending_config().is_none());
        service.stop().await?;

        let invalid = WatchConfigPatch {
            poll_interval_ms: Some(0),
            ..WatchConfigPatch::default()
        };
        assert!(matches!(
            service.stage_config(&invalid),
            Err(PipelineError::Config { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn preview_counts_and_conflicts() -> anyhow::Result<()> {
        let fixture = WatchFixture::new()?;
        let (service, _) = service(fixture.watch_config())?;
        crate::samples::create_sample_files(fixture.workplace(), false)?;
        fs::write(fixture.workplace().join("notes.txt"), b"hi")?;

        let report = service.preview().await?;
        assert_eq!(report.summary.total_files, 5);
        assert_eq!(report.summary.would_process, 2);
        assert_eq!(report.summary.would_skip, 3);
        assert_eq!(report.summary.conflicts, 0);

        let existing = fixture.expected_destination(
            ["Contract", "ClientA", "2024-01-15", "signed"],
            "Contract_ClientA_2024-01-15_signed.pdf",
        );
        if let Some(parent) = existing.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&existing, b"older")?;
        let report = service.preview().await?;
        assert_eq!(report.summary.conflicts, 1);
        assert!(fixture.workplace().join("random_file.pdf").exists());
        Ok(())
    }

    #[tokio::test]
    async fn existing_files_are_processed_when_enabled() -> anyhow::Result<()> {
        let fixture = WatchFixture::new()?;
        fixture.write_pdf("Invoice_ClientB_2024-01-16_executed.pdf")?;
        let config = WatchConfig {
            process_existing: true,
            ..fixture.watch_config()
        };
        let (service, _) = service(config)?;
        service.start().await?;
        assert!(wait_until(Duration::from_secs(5), || service.processed_count() == 1).await);
        service.stop().await?;
        Ok(())
    }

    #[tokio::test]
    async fn force_reset_clears_state() -> anyhow::Result<()> {
        let fixture = WatchFixture::new()?;
        let (service, _) = service(fixture.watch_config())?;
        service.start().await?;
        let path = fixture.write_pdf("random_file.pdf")?;
        assert_eq!(service.submit(&path, PathEventKind::Created), SubmitOutcome::Admitted);
        assert!(wait_until(Duration::from_secs(5), || service.retained_outcomes() == 1).await);

        service.force_reset().await?;
        assert_eq!(service.state(), WatcherState::Stopped);
        assert_eq!(service.retained_outcomes(), 0);
        assert_eq!(service.processed_count(), 0);
        assert!(service.status().last_error.is_none());
        Ok(())
    }
}
