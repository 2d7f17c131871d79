//! Sink factory - maps descriptor type tags to adapter constructors

use std::time::Duration;

use contracts::{ContractError, EventSink, SinkDescriptor, DEFAULT_WEBHOOK_THROTTLE_MS};
use tracing::{debug, error, instrument};

use crate::error::DispatcherError;
#[cfg(feature = "rdkafka")]
use crate::sinks::KafkaSink;
use crate::sinks::{LogSink, WebhookSink};

/// Values injected into every sink constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkContext {
    /// Cluster name shown in notifications
    pub cluster_name: String,
    /// Pause after each webhook send
    pub webhook_throttle: Duration,
}

impl Default for SinkContext {
    fn default() -> Self {
        Self {
            cluster_name: String::new(),
            webhook_throttle: Duration::from_millis(DEFAULT_WEBHOOK_THROTTLE_MS),
        }
    }
}

type SinkConstructor = fn(&SinkDescriptor, &SinkContext) -> Result<Box<dyn EventSink>, ContractError>;

static REGISTRY: &[(&str, SinkConstructor)] = &[
    ("log", build_log),
    #[cfg(feature = "rdkafka")]
    ("kafka", build_kafka),
    ("webhook", build_webhook),
];

fn build_log(_: &SinkDescriptor, _: &SinkContext) -> Result<Box<dyn EventSink>, ContractError> {
    Ok(Box::new(LogSink::new()))
}

#[cfg(feature = "rdkafka")]
fn build_kafka(
    descriptor: &SinkDescriptor,
    _: &SinkContext,
) -> Result<Box<dyn EventSink>, ContractError> {
    Ok(Box::new(KafkaSink::from_descriptor(descriptor)?))
}

fn build_webhook(
    descriptor: &SinkDescriptor,
    context: &SinkContext,
) -> Result<Box<dyn EventSink>, ContractError> {
    Ok(Box::new(WebhookSink::from_descriptor(descriptor, context)?))
}

/// Whether a type tag has a registered adapter
pub fn is_registered(type_tag: &str) -> bool {
    REGISTRY.iter().any(|(tag, _)| *tag == type_tag)
}

/// All registered type tags, in registry order
pub fn registered_types() -> Vec<&'static str> {
    REGISTRY.iter().map(|(tag, _)| *tag).collect()
}

/// Builds sinks from descriptors
#[derive(Debug, Clone, Default)]
pub struct SinkFactory {
    context: SinkContext,
}

impl SinkFactory {
    pub fn new(context: SinkContext) -> Self {
        Self { context }
    }

    /// Build one sink
    #[instrument(
        name = "sink_factory_build",
        skip(self, descriptor),
        fields(sink_type = %descriptor.type_tag)
    )]
    pub fn build(&self, descriptor: &SinkDescriptor) -> Result<Box<dyn EventSink>, DispatcherError> {
        let constructor = REGISTRY
            .iter()
            .find(|(tag, _)| *tag == descriptor.type_tag)
            .map(|(_, constructor)| *constructor)
            .ok_or_else(|| DispatcherError::unsupported(&descriptor.type_tag))?;

        let sink = constructor(descriptor, &self.context).map_err(|e| match e {
            ContractError::SinkConfig { message, .. } => {
                DispatcherError::sink_creation(descriptor.as_str(), message)
            }
            other => DispatcherError::Contract(other),
        })?;

        debug!(sink = sink.name(), "Sink created");
        Ok(sink)
    }

    /// Parse a raw descriptor and build it
    pub fn build_from_str(&self, raw: &str) -> Result<Box<dyn EventSink>, DispatcherError> {
        let descriptor = SinkDescriptor::parse(raw)?;
        self.build(&descriptor)
    }

    /// Build every descriptor, skipping the ones that fail
    ///
    /// Order of the successful sinks follows the input.
    pub fn build_all<S: AsRef<str>>(&self, descriptors: &[S]) -> Vec<Box<dyn EventSink>> {
        let mut sinks = Vec::with_capacity(descriptors.len());
        for raw in descriptors {
            let raw = raw.as_ref();
            match self.build_from_str(raw) {
                Ok(sink) => sinks.push(sink),
                Err(e) => {
                    error!(descriptor = raw, error = %e, "Failed to create sink");
                    let type_tag = raw.split(':').next().unwrap_or_default();
                    observability::record_sink_build_failure(type_tag);
                }
            }
        }
        sinks
    }
}
