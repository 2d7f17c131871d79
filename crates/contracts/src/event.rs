//! Cluster event data model
//!
//! `Event` mirrors the subset of a Kubernetes `core/v1` Event that sinks read.
//! `EventBatch` is what the watcher hands to the dispatcher; it is never
//! mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event type string for warnings
pub const EVENT_TYPE_WARNING: &str = "Warning";
/// Event type string for normal events
pub const EVENT_TYPE_NORMAL: &str = "Normal";

/// Object the event is about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectReference {
    pub kind: String,
    pub name: String,
    pub uid: String,
    pub namespace: String,
}

/// Component that reported the event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSource {
    pub component: String,
    pub host: String,
}

/// A single cluster lifecycle event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub uid: String,
    pub namespace: String,
    pub name: String,
    pub involved_object: ObjectReference,
    pub reason: String,
    pub message: String,
    /// Severity label (`Normal`, `Warning`, ...)
    #[serde(rename = "type")]
    pub event_type: String,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub source: EventSource,
}

impl Event {
    /// Severity derived from the event type
    pub fn severity(&self) -> Severity {
        Severity::from_type(&self.event_type)
    }

    /// Whether the involved object is a Pod
    pub fn is_pod_event(&self) -> bool {
        self.involved_object.kind == "Pod"
    }
}

/// Batch of events produced by one watch cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBatch {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl EventBatch {
    pub fn new(timestamp: DateTime<Utc>, events: Vec<Event>) -> Self {
        Self { timestamp, events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Event importance used for thresholding
///
/// Ordered by score: `Unknown(0) < Normal(1) < Warning(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    #[default]
    Unknown,
    Normal,
    Warning,
}

impl Severity {
    /// Map an event type label to a severity; unrecognized labels are `Unknown`
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            EVENT_TYPE_WARNING => Self::Warning,
            EVENT_TYPE_NORMAL => Self::Normal,
            _ => Self::Unknown,
        }
    }

    /// Numeric score (`Warning=2`, `Normal=1`, otherwise 0)
    pub fn score(self) -> u8 {
        match self {
            Self::Warning => 2,
            Self::Normal => 1,
            Self::Unknown => 0,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str(EVENT_TYPE_WARNING),
            Self::Normal => f.write_str(EVENT_TYPE_NORMAL),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}
