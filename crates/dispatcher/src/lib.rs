//! # Dispatcher
//!
//! 事件分发模块。
//!
//! 负责：
//! - 解析 sink 描述符并通过注册表构建 sink (log / kafka / webhook)
//! - 将每个 `EventBatch` 并发 fan-out 到所有 sink
//! - 单个 sink 的失败或 panic 不影响其他 sink

pub mod dispatcher;
pub mod error;
pub mod factory;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use contracts::{EventBatch, EventSink, SinkDescriptor};
pub use dispatcher::{create_dispatcher, Dispatcher};
pub use error::DispatcherError;
pub use factory::{is_registered, registered_types, SinkContext, SinkFactory};
pub use handle::SinkHandle;
pub use metrics::{DeliverySnapshot, DeliveryStats, MetricsSnapshot, SinkMetrics};
pub use sinks::{KafkaSink, KafkaSinkConfig, LogSink, WebhookSink, WebhookSinkConfig};
