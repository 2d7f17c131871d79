//! Sink implementations
//!
//! Contains LogSink, KafkaSink, and WebhookSink.

pub mod kafka;
mod log;
pub mod webhook;

pub use self::kafka::{KafkaSink, KafkaSinkConfig, KAFKA_SINK_NAME};
pub use self::log::{LogSink, LOG_SINK_NAME};
pub use self::webhook::{WebhookSink, WebhookSinkConfig, WEBHOOK_SINK_NAME};
