//! KafkaSink - publishes events as JSON points to a Kafka topic
//!
//! The sink owns exactly one producer. An export holds the producer lock for
//! the whole batch, so two overlapping dispatch cycles never interleave their
//! messages on the connection; the second batch waits for the first.

mod producer;

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use contracts::{ContractError, Event, EventBatch, EventSink, SinkDescriptor};
use observability::EventOutcome;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::{DeliverySnapshot, DeliveryStats};

pub use self::producer::MessageProducer;
#[cfg(feature = "rdkafka")]
pub use self::producer::RdKafkaProducer;

/// Name reported by [`KafkaSink`]
pub const KAFKA_SINK_NAME: &str = "KafkaSink";
/// Topic used when `eventstopic` is not set
pub const DEFAULT_EVENTS_TOPIC: &str = "heapster-events";

/// Tag keys attached to every point
pub const TAG_EVENT_ID: &str = "eventID";
pub const TAG_HOSTNAME: &str = "hostname";
pub const TAG_POD_ID: &str = "pod_id";
pub const TAG_POD_NAME: &str = "pod_name";

/// Message compression codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Snappy,
    Lz4,
    Zstd,
}

impl Compression {
    fn parse(value: &str) -> Result<Self, ContractError> {
        match value {
            "" | "none" => Ok(Self::None),
            "gzip" => Ok(Self::Gzip),
            "snappy" => Ok(Self::Snappy),
            "lz4" => Ok(Self::Lz4),
            "zstd" => Ok(Self::Zstd),
            other => Err(ContractError::sink_config(
                KAFKA_SINK_NAME,
                format!("unknown compression '{other}'"),
            )),
        }
    }

    /// librdkafka `compression.type` value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Snappy => "snappy",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }
}

/// SASL PLAIN credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaslCredentials {
    pub user: String,
    pub password: String,
}

/// Configuration for KafkaSink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaSinkConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    pub compression: Compression,
    pub sasl: Option<SaslCredentials>,
}

impl KafkaSinkConfig {
    /// Resolve config from a descriptor
    ///
    /// `brokers` may repeat and may hold comma-separated lists; when absent the
    /// descriptor address is used.
    pub fn from_descriptor(descriptor: &SinkDescriptor) -> Result<Self, ContractError> {
        let options = &descriptor.options;

        let mut brokers: Vec<String> = options
            .get("brokers")
            .unwrap_or_default()
            .iter()
            .flat_map(|value| split_list(value))
            .collect();
        if brokers.is_empty() {
            brokers = split_list(&descriptor.address);
        }
        if brokers.is_empty() {
            return Err(ContractError::sink_config(
                KAFKA_SINK_NAME,
                "missing 'brokers' option",
            ));
        }

        let topic = options
            .first("eventstopic")
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_EVENTS_TOPIC)
            .to_string();

        let compression = Compression::parse(options.first("compression").unwrap_or_default())?;

        let sasl = match (options.first("user"), options.first("password")) {
            (None, None) => None,
            (Some(user), Some(password)) => Some(SaslCredentials {
                user: user.to_string(),
                password: password.to_string(),
            }),
            _ => {
                return Err(ContractError::sink_config(
                    KAFKA_SINK_NAME,
                    "'user' and 'password' must be set together",
                ))
            }
        };

        Ok(Self {
            brokers,
            topic,
            compression,
            sasl,
        })
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Wire representation of one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KafkaSinkPoint {
    /// Full event, pretty-printed JSON
    #[serde(rename = "EventValue")]
    pub event_value: String,
    #[serde(rename = "EventTimestamp")]
    pub event_timestamp: DateTime<Utc>,
    #[serde(rename = "EventTags")]
    pub event_tags: BTreeMap<String, String>,
}

/// Translate an event into a point
///
/// Events without `lastTimestamp` are stamped with `fallback`, normally the
/// batch timestamp.
pub fn event_to_point(
    event: &Event,
    fallback: DateTime<Utc>,
) -> Result<KafkaSinkPoint, ContractError> {
    let event_timestamp = event.last_timestamp.unwrap_or(fallback);

    let event_value = serde_json::to_string_pretty(event)
        .map_err(|e| ContractError::translation(KAFKA_SINK_NAME, e.to_string()))?;

    let mut event_tags = BTreeMap::new();
    event_tags.insert(TAG_EVENT_ID.to_string(), event.uid.clone());
    if event.is_pod_event() {
        event_tags.insert(TAG_POD_ID.to_string(), event.involved_object.uid.clone());
        event_tags.insert(TAG_POD_NAME.to_string(), event.involved_object.name.clone());
    }
    event_tags.insert(TAG_HOSTNAME.to_string(), event.source.host.clone());

    Ok(KafkaSinkPoint {
        event_value,
        event_timestamp,
        event_tags,
    })
}

/// Turns one event into a message payload
type PointEncoder = fn(&Event, DateTime<Utc>) -> Result<Bytes, ContractError>;

fn encode_event(event: &Event, fallback: DateTime<Utc>) -> Result<Bytes, ContractError> {
    let point = event_to_point(event, fallback)?;
    serde_json::to_vec(&point)
        .map(Bytes::from)
        .map_err(|e| ContractError::translation(KAFKA_SINK_NAME, e.to_string()))
}

/// Sink that produces one Kafka message per event
pub struct KafkaSink {
    topic: String,
    producer: Mutex<Option<Box<dyn MessageProducer>>>,
    encode: PointEncoder,
    stats: DeliveryStats,
}

impl KafkaSink {
    /// Build the sink from a descriptor, connecting with rdkafka
    #[cfg(feature = "rdkafka")]
    pub fn from_descriptor(descriptor: &SinkDescriptor) -> Result<Self, ContractError> {
        let config = KafkaSinkConfig::from_descriptor(descriptor)?;
        let producer = RdKafkaProducer::connect(&config)?;
        info!(brokers = ?config.brokers, topic = %config.topic, "KafkaSink created");
        Ok(Self::with_producer(config.topic, Box::new(producer)))
    }

    /// Create a sink around an existing producer
    pub fn with_producer(topic: impl Into<String>, producer: Box<dyn MessageProducer>) -> Self {
        Self {
            topic: topic.into(),
            producer: Mutex::new(Some(producer)),
            encode: encode_event,
            stats: DeliveryStats::new(),
        }
    }

    #[cfg(test)]
    fn with_encoder(mut self, encode: PointEncoder) -> Self {
        self.encode = encode;
        self
    }

    /// Per-event outcome counters
    pub fn stats(&self) -> DeliverySnapshot {
        self.stats.snapshot()
    }
}

#[async_trait]
impl EventSink for KafkaSink {
    fn name(&self) -> &str {
        KAFKA_SINK_NAME
    }

    #[instrument(
        name = "kafka_sink_export",
        skip(self, batch),
        fields(topic = %self.topic, events = batch.events.len())
    )]
    async fn export_events(&self, batch: &EventBatch) {
        // held for the whole batch
        let mut guard = self.producer.lock().await;
        let Some(producer) = guard.as_mut() else {
            warn!(sink = KAFKA_SINK_NAME, "Export after stop ignored");
            return;
        };

        for event in &batch.events {
            let payload = match (self.encode)(event, batch.timestamp) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(sink = KAFKA_SINK_NAME, error = %e, "Failed to convert event to point");
                    self.stats.record(KAFKA_SINK_NAME, EventOutcome::TranslationFailed);
                    continue;
                }
            };

            match producer.produce(&self.topic, payload).await {
                Ok(()) => {
                    debug!(sink = KAFKA_SINK_NAME, event_id = %event.uid, "Produced");
                    self.stats.record(KAFKA_SINK_NAME, EventOutcome::Delivered);
                }
                Err(e) => {
                    error!(sink = KAFKA_SINK_NAME, event_id = %event.uid, error = %e, "Failed to produce event message");
                    self.stats.record(KAFKA_SINK_NAME, EventOutcome::DeliveryFailed);
                }
            }
        }
    }

    #[instrument(name = "kafka_sink_stop", skip(self))]
    async fn stop(&self) {
        let producer = self.producer.lock().await.take();
        match producer {
            Some(mut producer) => {
                if let Err(e) = producer.close().await {
                    error!(sink = KAFKA_SINK_NAME, error = %e, "Close failed on stop");
                }
                info!(sink = KAFKA_SINK_NAME, "KafkaSink stopped");
            }
            None => debug!(sink = KAFKA_SINK_NAME, "KafkaSink already stopped"),
        }
    }
}
