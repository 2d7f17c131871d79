//! LogSink - logs every event via tracing

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use contracts::{Event, EventBatch, EventSink};
use observability::EventOutcome;
use tracing::{info, instrument, warn};

use crate::metrics::{DeliverySnapshot, DeliveryStats};

/// Name reported by [`LogSink`]
pub const LOG_SINK_NAME: &str = "LogSink";

/// Sink that writes events to the process log
#[derive(Debug, Default)]
pub struct LogSink {
    stats: DeliveryStats,
    stopped: AtomicBool,
}

impl LogSink {
    /// Create a new LogSink
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-event outcome counters
    pub fn stats(&self) -> DeliverySnapshot {
        self.stats.snapshot()
    }

    fn log_event(&self, event: &Event) {
        info!(
            sink = LOG_SINK_NAME,
            namespace = %event.namespace,
            kind = %event.involved_object.kind,
            name = %event.involved_object.name,
            reason = %event.reason,
            event_type = %event.event_type,
            message = %event.message,
            "Event received"
        );
    }
}

#[async_trait]
impl EventSink for LogSink {
    fn name(&self) -> &str {
        LOG_SINK_NAME
    }

    #[instrument(
        name = "log_sink_export",
        skip(self, batch),
        fields(events = batch.events.len())
    )]
    async fn export_events(&self, batch: &EventBatch) {
        if self.stopped.load(Ordering::Acquire) {
            warn!(sink = LOG_SINK_NAME, "Export after stop ignored");
            return;
        }
        for event in &batch.events {
            self.log_event(event);
            self.stats.record(LOG_SINK_NAME, EventOutcome::Delivered);
        }
    }

    #[instrument(name = "log_sink_stop", skip(self))]
    async fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            info!(sink = LOG_SINK_NAME, "LogSink stopped");
        }
    }
}
