//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters/gauges the watcher pipeline and HTTP surface need.

use std::sync::Arc;
use std::time::Duration;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

const OUTCOME_LABELS: [&str; 3] = ["processed", "failed", "skipped"];

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    events_emitted_total: IntCounterVec,
    files_total: IntCounterVec,
    queue_depth: IntGauge,
    in_flight: IntGauge,
    stability_wait_ms: IntGauge,
    worker_errors_total: IntCounter,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Current number of queued files.
    pub queue_depth: i64,
    /// Current number of admitted-but-unfinished files.
    pub in_flight: i64,
    /// Files moved since the process started.
    pub files_processed: u64,
    /// Files whose processing failed.
    pub files_failed: u64,
    /// Files left in place on purpose.
    pub files_skipped: u64,
    /// Duration of the most recent stability wait (ms).
    pub stability_wait_ms: i64,
    /// Errors and panics contained at the worker boundary.
    pub worker_errors_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be
    /// built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            "http_requests_total",
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let events_emitted_total = counter_vec(
            "signet_events_emitted_total",
            "Domain events emitted by type",
            &["type"],
        )?;
        let files_total = counter_vec(
            "signet_files_total",
            "Processing outcomes recorded by status",
            &["status"],
        )?;
        let queue_depth = gauge("signet_queue_depth", "Files waiting in the work queue")?;
        let in_flight = gauge("signet_in_flight", "Files admitted and not yet finished")?;
        let stability_wait_ms = gauge(
            "signet_stability_wait_ms",
            "Duration of the most recent stability wait (ms)",
        )?;
        let worker_errors_total = IntCounter::with_opts(Opts::new(
            "signet_worker_errors_total",
            "Errors and panics contained by the processing worker",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "signet_worker_errors_total",
            source,
        })?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "signet_events_emitted_total", &events_emitted_total)?;
        register(&registry, "signet_files_total", &files_total)?;
        register(&registry, "signet_queue_depth", &queue_depth)?;
        register(&registry, "signet_in_flight", &in_flight)?;
        register(&registry, "signet_stability_wait_ms", &stability_wait_ms)?;
        register(&registry, "signet_worker_errors_total", &worker_errors_total)?;

        for status in OUTCOME_LABELS {
            let _ = files_total.with_label_values(&[status]);
        }

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                events_emitted_total,
                files_total,
                queue_depth,
                in_flight,
                stability_wait_ms,
                worker_errors_total,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        let code = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[route, code.as_str()])
            .inc();
    }

    /// Increment the emitted event counter for the specific event type.
    pub fn inc_event(&self, event_type: &str) {
        self.inner
            .events_emitted_total
            .with_label_values(&[event_type])
            .inc();
    }

    /// Increment the outcome counter for `status` (`processed`, `failed`, `skipped`).
    pub fn inc_file_outcome(&self, status: &str) {
        self.inner.files_total.with_label_values(&[status]).inc();
    }

    /// Set the queue depth gauge.
    pub fn set_queue_depth(&self, depth: usize) {
        self.inner.queue_depth.set(saturating_i64(depth));
    }

    /// Set the in-flight gauge.
    pub fn set_in_flight(&self, count: usize) {
        self.inner.in_flight.set(saturating_i64(count));
    }

    /// Record how long the latest stability wait took.
    pub fn observe_stability_wait(&self, duration: Duration) {
        self.inner
            .stability_wait_ms
            .set(Self::duration_to_ms(duration));
    }

    /// Increment the contained worker error counter.
    pub fn inc_worker_error(&self) {
        self.inner.worker_errors_total.inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let files = |status: &str| self.inner.files_total.with_label_values(&[status]).get();
        MetricsSnapshot {
            queue_depth: self.inner.queue_depth.get(),
            in_flight: self.inner.in_flight.get(),
            files_processed: files("processed"),
            files_failed: files("failed"),
            files_skipped: files("skipped"),
            stability_wait_ms: self.inner.stability_wait_ms.get(),
            worker_errors_total: self.inner.worker_errors_total.get(),
        }
    }

    /// Convert a duration to milliseconds saturating at `i64::MAX`.
    pub(crate) fn duration_to_ms(duration: Duration) -> i64 {
        i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn gauge(name: &'static str, help: &str) -> Result<IntGauge> {
    IntGauge::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

fn saturating_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_to_ms_saturates_on_large_values() {
        let duration = Duration::from_secs(u64::MAX / 2);
        assert_eq!(Metrics::duration_to_ms(duration), i64::MAX);
    }

    #[test]
    fn metrics_snapshot_reflects_updates() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/health", 200);
        metrics.inc_event("file_outcome");
        metrics.inc_file_outcome("processed");
        metrics.inc_file_outcome("processed");
        metrics.inc_file_outcome("skipped");
        metrics.set_queue_depth(3);
        metrics.set_in_flight(4);
        metrics.observe_stability_wait(Duration::from_millis(250));
        metrics.inc_worker_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.queue_depth, 3);
        assert_eq!(snapshot.in_flight, 4);
        assert_eq!(snapshot.files_processed, 2);
        assert_eq!(snapshot.files_failed, 0);
        assert_eq!(snapshot.files_skipped, 1);
        assert_eq!(snapshot.stability_wait_ms, 250);
        assert_eq!(snapshot.worker_errors_total, 1);

        let rendered = metrics.render()?;
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("signet_files_total"));
        assert!(rendered.contains("signet_queue_depth"));
        Ok(())
    }
}
