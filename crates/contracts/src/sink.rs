//! EventSink trait - Dispatcher output interface
//!
//! Defines the abstract interface every sink adapter implements.

use async_trait::async_trait;

use crate::EventBatch;

/// Event output trait
///
/// All sink implementations must implement this trait. Implementations are
/// shared between dispatch tasks, so every method takes `&self`.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver every event of the batch, best effort
    ///
    /// Never fails: per-event problems are logged and the event is skipped.
    async fn export_events(&self, batch: &EventBatch);

    /// Release held resources
    ///
    /// Idempotent, and safe to call on a sink that never connected.
    async fn stop(&self);
}
