//! Shared handler state.

use signet_events::EventBus;
use signet_pipeline::WatchService;
use signet_telemetry::Metrics;

pub(crate) struct ApiState {
    pub(crate) service: WatchService,
    pub(crate) telemetry: Metrics,
    pub(crate) events: EventBus,
}

impl ApiState {
    pub(crate) fn new(service: WatchService) -> Self {
        let telemetry = service.metrics().clone();
        let events = service.events().clone();
        Self {
            service,
            telemetry,
            events,
        }
    }
}
