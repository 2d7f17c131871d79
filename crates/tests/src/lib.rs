//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 -> 工厂 -> 分发器 的完整链路
//! - 本地 axum 接收端上的 webhook e2e 测试

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::{Method, StatusCode, Uri};
    use axum::routing::post;
    use axum::Router;
    use chrono::Utc;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Event, EventBatch, ObjectReference};
    use dispatcher::{create_dispatcher, SinkContext, SinkFactory};
    use tokio::net::TcpListener;

    /// Method, path and body of every request the receiver saw
    type Received = Arc<Mutex<Vec<(Method, String, String)>>>;

    async fn record(
        State(store): State<Received>,
        method: Method,
        uri: Uri,
        body: String,
    ) -> StatusCode {
        if let Ok(mut requests) = store.lock() {
            requests.push((method, uri.path().to_string(), body));
        }
        StatusCode::OK
    }

    /// Webhook receiver on an ephemeral local port
    async fn spawn_receiver() -> (u16, Received) {
        let received: Received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/hook", post(record))
            .route("/alerts", post(record))
            .fallback(record)
            .with_state(Arc::clone(&received));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (port, received)
    }

    fn event(event_type: &str, namespace: &str) -> Event {
        Event {
            uid: format!("{namespace}-{event_type}"),
            namespace: namespace.to_string(),
            name: "web-0.17a2b".to_string(),
            involved_object: ObjectReference {
                kind: "Pod".to_string(),
                name: "web-0".to_string(),
                namespace: namespace.to_string(),
                ..Default::default()
            },
            reason: "BackOff".to_string(),
            message: "Back-off restarting failed container".to_string(),
            event_type: event_type.to_string(),
            last_timestamp: Some(Utc::now()),
            ..Default::default()
        }
    }

    fn context() -> SinkContext {
        SinkContext {
            cluster_name: "e2e".to_string(),
            webhook_throttle: Duration::ZERO,
        }
    }

    /// Descriptor -> factory -> dispatcher -> webhook -> local receiver
    #[tokio::test]
    async fn test_e2e_webhook_delivery() {
        let (port, received) = spawn_receiver().await;
        let descriptor = format!("webhook://127.0.0.1:{port}/hook?level=Warning&namespaces=default");

        let dispatcher = create_dispatcher(&[descriptor], context());
        assert_eq!(dispatcher.sink_count(), 1);

        dispatcher
            .export_events(EventBatch::new(
                Utc::now(),
                vec![
                    event("Warning", "default"),
                    event("Normal", "default"),
                    event("Warning", "foo"),
                ],
            ))
            .await;
        dispatcher.stop().await;

        let requests = received.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        let (method, path, body) = &requests[0];
        assert_eq!(*method, Method::POST);
        assert_eq!(path, "/hook");
        assert!(body.contains(r#""namespace":"default""#));

        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(body["msgtype"], "text");
        assert_eq!(body["clustername"], "e2e");
        assert_eq!(body["eventtype"], "Warning");
        assert_eq!(body["pod"], "web-0.17a2b");
    }

    /// One bad descriptor does not prevent the others
    #[tokio::test]
    async fn test_e2e_partial_build_failure() {
        let (port, received) = spawn_receiver().await;
        let descriptors = vec![
            "influxdb://localhost:8086?db=k8s".to_string(),
            "log".to_string(),
            format!("webhook://127.0.0.1:{port}/alerts"),
            "kafka:?eventstopic=x".to_string(),
        ];

        let dispatcher = create_dispatcher(&descriptors, context());
        assert_eq!(dispatcher.sink_names(), vec!["LogSink", "WebHookSink"]);

        dispatcher
            .export_events(EventBatch::new(Utc::now(), vec![event("Warning", "prod")]))
            .await;

        let metrics = dispatcher.metrics();
        assert!(metrics.iter().all(|(_, m)| m.batch_count == 1 && m.event_count == 1));
        let requests = received.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].1, "/alerts");
    }

    /// Configuration file content drives which sinks get built
    #[tokio::test]
    async fn test_config_to_dispatcher() {
        let config = ConfigLoader::load_from_str(
            r#"
cluster_name = "staging"
webhook_throttle_ms = 0
sinks = [
    "log",
    "webhook://example.com/hook?level=Normal&label=team:%20platform",
]
"#,
            ConfigFormat::Toml,
        )
        .unwrap();

        let factory = SinkFactory::new(SinkContext {
            cluster_name: config.cluster_name.clone().unwrap_or_default(),
            webhook_throttle: Duration::from_millis(config.webhook_throttle_ms),
        });
        let sinks = factory.build_all(&config.sinks);
        let names: Vec<_> = sinks.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["LogSink", "WebHookSink"]);
    }

    /// The sample descriptor resolves to an http endpoint on the host
    #[test]
    fn test_webhook_endpoint_resolution() {
        let descriptor = contracts::SinkDescriptor::parse("webhook://example.com/hook").unwrap();
        let config = dispatcher::WebhookSinkConfig::from_descriptor(&descriptor, &context());
        assert_eq!(config.endpoint, "http://example.com/hook");
    }
}
