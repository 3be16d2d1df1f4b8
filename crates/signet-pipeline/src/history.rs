//! Bounded, newest-first record of processing outcomes plus counters.
//!
//! # Design
//! - One mutex guards the ring, the counters, and the last error so status
//!   reads see a consistent snapshot.
//! - Recording an outcome also publishes it on the bus and bumps metrics.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use signet_events::{Event, EventBus, OutcomeStatus};
use signet_telemetry::Metrics;
use tracing::error;

use crate::model::ProcessingOutcome;

/// Publish `event` and count it by kind.
pub(crate) fn publish_event(events: &EventBus, metrics: &Metrics, event: Event) {
    metrics.inc_event(event.kind());
    let _ = events.publish(event);
}

/// Shared outcome history.
#[derive(Clone)]
pub struct OutcomeHistory {
    state: Arc<Mutex<HistoryState>>,
    events: EventBus,
    metrics: Metrics,
}

struct HistoryState {
    capacity: usize,
    entries: VecDeque<ProcessingOutcome>,
    processed: u64,
    total: u64,
    last_error: Option<String>,
}

impl OutcomeHistory {
    /// Empty history keeping at most `capacity` outcomes.
    #[must_use]
    pub fn new(capacity: usize, events: EventBus, metrics: Metrics) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Arc::new(Mutex::new(HistoryState {
                capacity,
                entries: VecDeque::with_capacity(capacity),
                processed: 0,
                total: 0,
                last_error: None,
            })),
            events,
            metrics,
        }
    }

    /// Append `outcome`, evicting the oldest entry when full.
    pub fn record(&self, outcome: ProcessingOutcome) {
        let event = Event::FileOutcome {
            outcome_id: outcome.id,
            source_path: outcome.source_path.display().to_string(),
            destination_path: outcome
                .destination_path
                .as_ref()
                .map(|path| path.display().to_string()),
            status: outcome.status,
            error: outcome.error.clone(),
        };
        let status = outcome.status;
        {
            let mut state = self.lock();
            state.total = state.total.saturating_add(1);
            match status {
                OutcomeStatus::Processed => state.processed = state.processed.saturating_add(1),
                OutcomeStatus::Failed => state.last_error.clone_from(&outcome.error),
                OutcomeStatus::Skipped => {}
            }
            if state.entries.len() >= state.capacity {
                let _ = state.entries.pop_back();
            }
            state.entries.push_front(outcome);
        }
        self.metrics.inc_file_outcome(status.as_str());
        publish_event(&self.events, &self.metrics, event);
    }

    /// Up to `limit` outcomes, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<ProcessingOutcome> {
        self.lock().entries.iter().take(limit).cloned().collect()
    }

    /// Number of outcomes currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Files moved since the last reset.
    #[must_use]
    pub fn processed_count(&self) -> u64 {
        self.lock().processed
    }

    /// Outcomes recorded since the last reset, including evicted ones.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.lock().total
    }

    /// Error text of the most recent failed outcome.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Change the retention bound, trimming the oldest entries if needed.
    pub fn set_capacity(&self, capacity: usize) {
        let mut state = self.lock();
        state.capacity = capacity.max(1);
        let capacity = state.capacity;
        state.entries.truncate(capacity);
    }

    /// Drop every entry and zero the counters.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.processed = 0;
        state.total = 0;
        state.last_error = None;
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("outcome history mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProcessingOutcome;

    fn history(capacity: usize) -> anyhow::Result<(OutcomeHistory, EventBus, Metrics)> {
        let events = EventBus::new();
        let metrics = Metrics::new()?;
        Ok((
            OutcomeHistory::new(capacity, events.clone(), metrics.clone()),
            events,
            metrics,
        ))
    }

    #[test]
    fn keeps_newest_first_and_evicts_oldest() -> anyhow::Result<()> {
        let (history, _, _) = history(3)?;
        for index in 0..5 {
            history.record(ProcessingOutcome::new(
                format!("/in/{index}.pdf"),
                OutcomeStatus::Processed,
            ));
        }
        let recent = history.recent(10);
        let names: Vec<String> = recent
            .iter()
            .map(|outcome| outcome.source_path.display().to_string())
            .collect();
        assert_eq!(names, vec!["/in/4.pdf", "/in/3.pdf", "/in/2.pdf"]);
        assert_eq!(history.processed_count(), 5);
        assert_eq!(history.total(), 5);
        assert_eq!(history.recent(1).len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn record_publishes_and_counts() -> anyhow::Result<()> {
        let (history, events, metrics) = history(100)?;
        let mut stream = events.subscribe(None);
        history.record(
            ProcessingOutcome::new("/in/a.pdf", OutcomeStatus::Failed).with_error("disk full"),
        );
        history.record(ProcessingOutcome::new("/in/b.pdf", OutcomeStatus::Skipped));

        let first = stream.next().await.map(|envelope| envelope.event);
        assert!(matches!(
            first,
            Some(Event::FileOutcome {
                status: OutcomeStatus::Failed,
                ..
            })
        ));
        assert_eq!(history.processed_count(), 0);
        assert_eq!(history.last_error().as_deref(), Some("disk full"));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.files_failed, 1);
        assert_eq!(snapshot.files_skipped, 1);
        Ok(())
    }

    #[test]
    fn reset_and_capacity_changes() -> anyhow::Result<()> {
        let (history, _, _) = history(100)?;
        for index in 0..4 {
            history.record(ProcessingOutcome::new(
                format!("/in/{index}.pdf"),
                OutcomeStatus::Processed,
            ));
        }
        history.set_capacity(2);
        assert_eq!(history.len(), 2);
        history.reset();
        assert!(history.is_empty());
        assert_eq!(history.processed_count(), 0);
        Ok(())
    }
}
