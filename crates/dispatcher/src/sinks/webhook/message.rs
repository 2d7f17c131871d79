//! Webhook message rendering

use chrono::{DateTime, Utc};
use contracts::Event;
use serde::Serialize;

/// `msgtype` of every message; receivers render the text content
pub const DEFAULT_MSG_TYPE: &str = "text";

/// Base text template, filled positionally by [`render_content`]
const BASE_TEMPLATE_FIELDS: [&str; 8] = [
    "ClusterName",
    "Level",
    "Kind",
    "Namespace",
    "Name",
    "Reason",
    "Timestamp",
    "Message",
];

/// Body posted to the webhook endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    pub msgtype: String,
    pub text: TextContent,
    pub clustername: String,
    pub eventtype: String,
    pub namespace: String,
    pub pod: String,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub content: String,
}

impl WebhookMessage {
    pub fn from_event(event: &Event, cluster_name: &str, labels: &[String]) -> Self {
        Self {
            msgtype: DEFAULT_MSG_TYPE.to_string(),
            text: TextContent {
                content: render_content(event, cluster_name, labels),
            },
            clustername: cluster_name.to_string(),
            eventtype: event.event_type.clone(),
            namespace: event.namespace.clone(),
            pod: event.name.clone(),
            reason: event.reason.clone(),
            message: event.message.clone(),
        }
    }
}

/// Render the text content of a message
///
/// Each label is prepended as its own line, in configuration order, so the
/// last configured label ends up on the first line.
pub fn render_content(event: &Event, cluster_name: &str, labels: &[String]) -> String {
    let timestamp = format_timestamp(event.last_timestamp);
    let values = [
        cluster_name,
        event.event_type.as_str(),
        event.involved_object.kind.as_str(),
        event.namespace.as_str(),
        event.name.as_str(),
        event.reason.as_str(),
        timestamp.as_str(),
        event.message.as_str(),
    ];

    let mut content = String::new();
    for (idx, (field, value)) in BASE_TEMPLATE_FIELDS.iter().zip(values).enumerate() {
        if idx > 0 {
            content.push('\n');
        }
        content.push_str(field);
        content.push_str(": ");
        content.push_str(value);
        // blank line after the cluster header
        if idx == 0 {
            content.push('\n');
        }
    }

    for label in labels {
        content = format!("{label}\n{content}");
    }
    content
}

/// Human-readable UTC timestamp, `unknown` when absent
pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S %z %Z").to_string(),
        None => "unknown".to_string(),
    }
}
