//! Dispatcher - fans each batch out to every sink

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{EventBatch, EventSink};
use tracing::{debug, error, info, instrument};

use crate::factory::{SinkContext, SinkFactory};
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;

/// Holds the configured sinks and delivers batches to all of them
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    stopped: AtomicBool,
}

impl Dispatcher {
    pub fn new(sinks: Vec<Box<dyn EventSink>>) -> Self {
        Self {
            handles: sinks.into_iter().map(SinkHandle::new).collect(),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn sink_count(&self) -> usize {
        self.handles.len()
    }

    /// Names of the configured sinks, in configuration order
    pub fn sink_names(&self) -> Vec<&str> {
        self.handles.iter().map(SinkHandle::name).collect()
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Deliver one batch to every sink
    ///
    /// Sinks run concurrently; returns once all of them have finished.
    #[instrument(
        name = "dispatcher_export_events",
        skip(self, batch),
        fields(events = batch.len(), sinks = self.handles.len())
    )]
    pub async fn export_events(&self, batch: EventBatch) {
        if self.stopped.load(Ordering::Acquire) {
            error!("Export after stop ignored");
            return;
        }

        observability::record_batch_received(batch.len());
        let batch = Arc::new(batch);

        let tasks: Vec<_> = self
            .handles
            .iter()
            .map(|handle| handle.export(Arc::clone(&batch)))
            .collect();

        for (handle, task) in self.handles.iter().zip(tasks) {
            if let Err(e) = task.await {
                handle.metrics().inc_failure_count();
                observability::record_batch_exported(handle.name(), batch.len(), 0.0, false);
                error!(sink = %handle.name(), error = %e, "Sink export task failed");
            }
        }

        debug!(events = batch.len(), "Batch dispatched");
    }

    /// Stop every sink once
    #[instrument(name = "dispatcher_stop", skip(self))]
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        for handle in &self.handles {
            handle.stop().await;
        }
        info!(sinks = self.handles.len(), "Dispatcher stopped");
    }
}

/// Build the sinks named by `descriptors` and wrap them in a dispatcher
///
/// Descriptors that fail to build are logged and left out.
pub fn create_dispatcher<S: AsRef<str>>(descriptors: &[S], context: SinkContext) -> Dispatcher {
    let factory = SinkFactory::new(context);
    let sinks = factory.build_all(descriptors);
    info!(
        configured = descriptors.len(),
        created = sinks.len(),
        "Sinks created"
    );
    Dispatcher::new(sinks)
}
