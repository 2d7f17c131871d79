//! SinkHandle - owns a sink together with its dispatch metrics

use std::sync::Arc;
use std::time::Instant;

use contracts::{EventBatch, EventSink};
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use crate::metrics::SinkMetrics;

/// Handle to a configured sink
pub struct SinkHandle {
    /// Sink name
    name: String,
    sink: Arc<dyn EventSink>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
}

impl SinkHandle {
    pub fn new(sink: Box<dyn EventSink>) -> Self {
        let sink: Arc<dyn EventSink> = Arc::from(sink);
        Self {
            name: sink.name().to_string(),
            sink,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Export a batch on its own task
    ///
    /// The returned handle resolves once the sink has processed the whole
    /// batch; a panic inside the sink surfaces as a `JoinError`.
    pub fn export(&self, batch: Arc<EventBatch>) -> JoinHandle<()> {
        let sink = Arc::clone(&self.sink);
        let metrics = Arc::clone(&self.metrics);
        let name = self.name.clone();

        tokio::spawn(async move {
            let start = Instant::now();
            sink.export_events(&batch).await;
            let elapsed = start.elapsed();

            let latency_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
            metrics.record_export(batch.len(), latency_us);
            observability::record_batch_exported(
                &name,
                batch.len(),
                elapsed.as_secs_f64() * 1000.0,
                true,
            );
            debug!(sink = %name, events = batch.len(), latency_us, "Batch exported");
        })
    }

    /// Release the sink's resources
    #[instrument(name = "sink_handle_stop", skip(self), fields(sink = %self.name))]
    pub async fn stop(&self) {
        self.sink.stop().await;
        debug!(sink = %self.name, "SinkHandle stopped");
    }
}
