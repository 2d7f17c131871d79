//! WebhookSink - posts filtered events as JSON notifications
//!
//! Per event: severity gate, namespace allow-list, kind allow-list, render,
//! one POST, then a fixed pause before the next event.

mod message;
mod transport;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use contracts::{ContractError, Event, EventBatch, EventSink, Severity, SinkDescriptor};
use observability::EventOutcome;
use tracing::{debug, error, info, instrument, warn};

use crate::factory::SinkContext;
use crate::metrics::{DeliverySnapshot, DeliveryStats};

pub use self::message::{format_timestamp, render_content, TextContent, WebhookMessage};
pub use self::transport::{HttpTransport, WebhookTransport, CONTENT_TYPE_JSON};

/// Name reported by [`WebhookSink`]
pub const WEBHOOK_SINK_NAME: &str = "WebHookSink";
/// Endpoint used when the descriptor carries no host
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9999/kube";
/// HTTP status treated as a successful delivery
const STATUS_OK: u16 = 200;

/// Configuration for WebhookSink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSinkConfig {
    pub endpoint: String,
    /// Minimum severity forwarded
    pub level: Severity,
    /// Extra template lines
    pub labels: Vec<String>,
    /// Namespace allow-list (empty = all)
    pub namespaces: Vec<String>,
    /// Involved-object kind allow-list (empty = all)
    pub kinds: Vec<String>,
    pub cluster_name: String,
    /// Pause after every send attempt
    pub throttle: Duration,
}

impl WebhookSinkConfig {
    /// Resolve config from a descriptor and the injected context
    pub fn from_descriptor(descriptor: &SinkDescriptor, context: &SinkContext) -> Self {
        let options = &descriptor.options;

        let endpoint = if descriptor.host.is_empty() {
            DEFAULT_ENDPOINT.to_string()
        } else {
            format!("http://{}", descriptor.address)
        };

        Self {
            endpoint,
            level: options
                .first("level")
                .map(Severity::from_type)
                .unwrap_or(Severity::Warning),
            labels: options.get("label").map(<[String]>::to_vec).unwrap_or_default(),
            namespaces: allow_list(options.first("namespaces")),
            kinds: allow_list(options.first("kinds")),
            cluster_name: context.cluster_name.clone(),
            throttle: context.webhook_throttle,
        }
    }
}

fn allow_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Sink that notifies an HTTP endpoint about important events
pub struct WebhookSink {
    config: WebhookSinkConfig,
    transport: Box<dyn WebhookTransport>,
    stats: DeliveryStats,
    stopped: AtomicBool,
}

impl WebhookSink {
    /// Build the sink from a descriptor with the HTTP transport
    pub fn from_descriptor(
        descriptor: &SinkDescriptor,
        context: &SinkContext,
    ) -> Result<Self, ContractError> {
        let config = WebhookSinkConfig::from_descriptor(descriptor, context);
        let transport = HttpTransport::new()?;
        info!(
            endpoint = %config.endpoint,
            level = %config.level,
            namespaces = ?config.namespaces,
            kinds = ?config.kinds,
            "WebhookSink created"
        );
        Ok(Self::with_transport(config, Box::new(transport)))
    }

    /// Create a sink with a custom transport
    pub fn with_transport(config: WebhookSinkConfig, transport: Box<dyn WebhookTransport>) -> Self {
        Self {
            config,
            transport,
            stats: DeliveryStats::new(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Per-event outcome counters
    pub fn stats(&self) -> DeliverySnapshot {
        self.stats.snapshot()
    }

    /// Whether the event passes the severity, namespace and kind filters
    fn admits(&self, event: &Event) -> bool {
        if event.severity() < self.config.level {
            return false;
        }
        if !self.config.namespaces.is_empty() && !self.config.namespaces.contains(&event.namespace)
        {
            return false;
        }
        if !self.config.kinds.is_empty()
            && !self.config.kinds.contains(&event.involved_object.kind)
        {
            return false;
        }
        true
    }

    async fn send(&self, event: &Event, body: Vec<u8>) {
        match self.transport.post_json(&self.config.endpoint, body).await {
            Ok(STATUS_OK) => {
                debug!(sink = WEBHOOK_SINK_NAME, event_id = %event.uid, "Sent");
                self.stats.record(WEBHOOK_SINK_NAME, EventOutcome::Delivered);
            }
            Ok(status) => {
                error!(
                    sink = WEBHOOK_SINK_NAME,
                    event_id = %event.uid,
                    status,
                    "Failed to send msg to webhook, unexpected response code"
                );
                self.stats.record(WEBHOOK_SINK_NAME, EventOutcome::DeliveryFailed);
            }
            Err(e) => {
                error!(sink = WEBHOOK_SINK_NAME, event_id = %event.uid, error = %e, "Failed to send msg to webhook");
                self.stats.record(WEBHOOK_SINK_NAME, EventOutcome::DeliveryFailed);
            }
        }
    }
}

#[async_trait]
impl EventSink for WebhookSink {
    fn name(&self) -> &str {
        WEBHOOK_SINK_NAME
    }

    #[instrument(
        name = "webhook_sink_export",
        skip(self, batch),
        fields(endpoint = %self.config.endpoint, events = batch.events.len())
    )]
    async fn export_events(&self, batch: &EventBatch) {
        if self.stopped.load(Ordering::Acquire) {
            warn!(sink = WEBHOOK_SINK_NAME, "Export after stop ignored");
            return;
        }

        for event in &batch.events {
            if !self.admits(event) {
                self.stats.record(WEBHOOK_SINK_NAME, EventOutcome::Filtered);
                continue;
            }

            let message =
                WebhookMessage::from_event(event, &self.config.cluster_name, &self.config.labels);
            let body = match serde_json::to_vec(&message) {
                Ok(body) => body,
                Err(e) => {
                    warn!(sink = WEBHOOK_SINK_NAME, error = %e, "Failed to marshal msg");
                    self.stats.record(WEBHOOK_SINK_NAME, EventOutcome::TranslationFailed);
                    continue;
                }
            };

            self.send(event, body).await;

            if !self.config.throttle.is_zero() {
                tokio::time::sleep(self.config.throttle).await;
            }
        }
    }

    #[instrument(name = "webhook_sink_stop", skip(self))]
    async fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            info!(sink = WEBHOOK_SINK_NAME, "WebhookSink stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::ObjectReference;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    /// Transport that records every request
    #[derive(Clone)]
    struct MockTransport {
        calls: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
        status: u16,
        fail: bool,
    }

    impl MockTransport {
        fn new(status: u16) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                status,
                fail: false,
            }
        }

        fn calls(&self) -> Vec<(String, serde_json::Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WebhookTransport for MockTransport {
        async fn post_json(&self, endpoint: &str, body: Vec<u8>) -> Result<u16, ContractError> {
            let body = serde_json::from_slice(&body).unwrap();
            self.calls.lock().unwrap().push((endpoint.to_string(), body));
            if self.fail {
                return Err(ContractError::delivery(WEBHOOK_SINK_NAME, "connection refused"));
            }
            Ok(self.status)
        }
    }

    fn context() -> SinkContext {
        SinkContext {
            cluster_name: "prod".into(),
            webhook_throttle: Duration::ZERO,
        }
    }

    fn sink(raw: &str, transport: &MockTransport) -> WebhookSink {
        let descriptor = SinkDescriptor::parse(raw).unwrap();
        let config = WebhookSinkConfig::from_descriptor(&descriptor, &context());
        WebhookSink::with_transport(config, Box::new(transport.clone()))
    }

    fn event(event_type: &str, namespace: &str, kind: &str) -> Event {
        Event {
            uid: format!("{namespace}-{kind}-{event_type}"),
            namespace: namespace.into(),
            name: "web-0.17a".into(),
            involved_object: ObjectReference {
                kind: kind.into(),
                name: "web-0".into(),
                ..Default::default()
            },
            reason: "BackOff".into(),
            message: "restarting".into(),
            event_type: event_type.into(),
            last_timestamp: Some(Utc::now()),
            ..Default::default()
        }
    }

    fn batch(events: Vec<Event>) -> EventBatch {
        EventBatch::new(Utc::now(), events)
    }

    #[test]
    fn test_config_from_descriptor() {
        let descriptor = SinkDescriptor::parse(
            "webhook://example.com/hook?level=Normal&label=a&label=b&namespaces=kube-system,default&kinds=Pod",
        )
        .unwrap();
        let config = WebhookSinkConfig::from_descriptor(&descriptor, &context());

        assert_eq!(config.endpoint, "http://example.com/hook");
        assert_eq!(config.level, Severity::Normal);
        assert_eq!(config.labels, vec!["a", "b"]);
        assert_eq!(config.namespaces, vec!["kube-system", "default"]);
        assert_eq!(config.kinds, vec!["Pod"]);
        assert_eq!(config.cluster_name, "prod");
    }

    #[test]
    fn test_config_defaults() {
        let descriptor = SinkDescriptor::parse("webhook:?namespaces=").unwrap();
        let config = WebhookSinkConfig::from_descriptor(&descriptor, &context());

        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.level, Severity::Warning);
        assert!(config.labels.is_empty());
        assert!(config.namespaces.is_empty());
        assert!(config.kinds.is_empty());
    }

    #[test]
    fn test_config_without_host_uses_default_endpoint() {
        let descriptor = SinkDescriptor::parse("webhook:///kube?level=Normal").unwrap();
        let config = WebhookSinkConfig::from_descriptor(&descriptor, &context());
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.level, Severity::Normal);
    }

    #[tokio::test]
    async fn test_severity_threshold() {
        let transport = MockTransport::new(200);
        let sink = sink("webhook://example.com/hook?level=Warning", &transport);

        sink.export_events(&batch(vec![event("Normal", "default", "Pod")]))
            .await;
        assert!(transport.calls().is_empty());

        sink.export_events(&batch(vec![event("Warning", "default", "Pod")]))
            .await;
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(transport.calls()[0].0, "http://example.com/hook");
    }

    #[tokio::test]
    async fn test_unknown_level_forwards_everything() {
        let transport = MockTransport::new(200);
        let sink = sink("webhook://example.com/hook?level=Verbose", &transport);

        sink.export_events(&batch(vec![
            event("Custom", "default", "Pod"),
            event("Normal", "default", "Pod"),
        ]))
        .await;
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_namespace_filter() {
        let transport = MockTransport::new(200);
        let sink = sink(
            "webhook://example.com/hook?namespaces=kube-system,default",
            &transport,
        );

        sink.export_events(&batch(vec![
            event("Warning", "foo", "Pod"),
            event("Warning", "default", "Pod"),
        ]))
        .await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1["namespace"], "default");
        assert_eq!(sink.stats().filtered, 1);
    }

    #[tokio::test]
    async fn test_kind_filter() {
        let transport = MockTransport::new(200);
        let sink = sink("webhook://example.com/hook?kinds=Node", &transport);

        sink.export_events(&batch(vec![
            event("Warning", "default", "Pod"),
            event("Warning", "default", "Node"),
        ]))
        .await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let content = calls[0].1["text"]["content"].as_str().unwrap();
        assert!(content.contains("Kind: Node"), "got: {content}");
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_the_batch() {
        let transport = MockTransport::new(500);
        let sink = sink("webhook://example.com/hook", &transport);

        sink.export_events(&batch(vec![
            event("Warning", "a", "Pod"),
            event("Warning", "b", "Pod"),
        ]))
        .await;
        assert_eq!(transport.calls().len(), 2);
        assert_eq!(sink.stats().delivery_failures, 2);

        let mut broken = MockTransport::new(200);
        broken.fail = true;
        let sink = self::sink("webhook://example.com/hook", &broken);
        sink.export_events(&batch(vec![
            event("Warning", "a", "Pod"),
            event("Warning", "b", "Pod"),
        ]))
        .await;
        assert_eq!(broken.calls().len(), 2);
        assert_eq!(sink.stats().delivered, 0);
    }

    #[tokio::test]
    async fn test_only_200_counts_as_delivered() {
        for status in [201, 204] {
            let transport = MockTransport::new(status);
            let sink = sink("webhook://example.com/hook", &transport);

            sink.export_events(&batch(vec![event("Warning", "default", "Pod")]))
                .await;

            assert_eq!(transport.calls().len(), 1);
            let stats = sink.stats();
            assert_eq!(stats.delivered, 0, "status {status}");
            assert_eq!(stats.delivery_failures, 1, "status {status}");
        }
    }

    #[tokio::test]
    async fn test_events_sent_in_batch_order() {
        let transport = MockTransport::new(200);
        let sink = sink("webhook://example.com/hook", &transport);

        sink.export_events(&batch(vec![
            event("Warning", "first", "Pod"),
            event("Warning", "second", "Pod"),
            event("Warning", "third", "Pod"),
        ]))
        .await;

        let namespaces: Vec<_> = transport
            .calls()
            .iter()
            .map(|(_, body)| body["namespace"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(namespaces, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_throttle_between_sends() {
        let transport = MockTransport::new(200);
        let descriptor = SinkDescriptor::parse("webhook://example.com/hook").unwrap();
        let mut config = WebhookSinkConfig::from_descriptor(&descriptor, &context());
        config.throttle = Duration::from_millis(20);
        let sink = WebhookSink::with_transport(config, Box::new(transport.clone()));

        let start = Instant::now();
        sink.export_events(&batch(vec![
            event("Warning", "a", "Pod"),
            event("Normal", "b", "Pod"),
            event("Warning", "c", "Pod"),
        ]))
        .await;

        assert_eq!(transport.calls().len(), 2);
        // filtered events are not throttled
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let transport = MockTransport::new(200);
        let sink = sink("webhook://example.com/hook", &transport);

        sink.stop().await;
        sink.stop().await;
        sink.export_events(&batch(vec![event("Warning", "default", "Pod")]))
            .await;
        assert!(transport.calls().is_empty());
    }
}
