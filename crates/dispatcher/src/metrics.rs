//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

use observability::{record_event_outcome, EventOutcome};

/// Dispatcher-side metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Batches handed to the sink
    batch_count: AtomicU64,
    /// Events handed to the sink
    event_count: AtomicU64,
    /// Export tasks that panicked
    failure_count: AtomicU64,
    /// Duration of the most recent export, in microseconds
    last_latency_us: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_count(&self) -> u64 {
        self.batch_count.load(Ordering::Relaxed)
    }

    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn last_latency_us(&self) -> u64 {
        self.last_latency_us.load(Ordering::Relaxed)
    }

    /// Record a completed export of `events` events
    pub fn record_export(&self, events: usize, latency_us: u64) {
        self.batch_count.fetch_add(1, Ordering::Relaxed);
        self.event_count.fetch_add(events as u64, Ordering::Relaxed);
        self.last_latency_us.store(latency_us, Ordering::Relaxed);
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            batch_count: self.batch_count(),
            event_count: self.event_count(),
            failure_count: self.failure_count(),
            last_latency_us: self.last_latency_us(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub batch_count: u64,
    pub event_count: u64,
    pub failure_count: u64,
    pub last_latency_us: u64,
}

/// Per-event outcome counters kept by every sink adapter
///
/// Each recorded outcome is mirrored into the Prometheus counter
/// `kube_eventer_events_total{sink, outcome}`.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    filtered: AtomicU64,
    translation_failures: AtomicU64,
    delivery_failures: AtomicU64,
}

impl DeliveryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, sink_name: &str, outcome: EventOutcome) {
        let counter = match outcome {
            EventOutcome::Delivered => &self.delivered,
            EventOutcome::Filtered => &self.filtered,
            EventOutcome::TranslationFailed => &self.translation_failures,
            EventOutcome::DeliveryFailed => &self.delivery_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        record_event_outcome(sink_name, outcome);
    }

    pub fn snapshot(&self) -> DeliverySnapshot {
        DeliverySnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            translation_failures: self.translation_failures.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`DeliveryStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliverySnapshot {
    pub delivered: u64,
    pub filtered: u64,
    pub translation_failures: u64,
    pub delivery_failures: u64,
}
