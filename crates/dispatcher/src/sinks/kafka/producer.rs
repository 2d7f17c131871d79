//! Kafka producer seam
//!
//! The sink talks to the broker through [`MessageProducer`]; the real
//! implementation wraps an rdkafka `FutureProducer` and is compiled with the
//! `rdkafka` feature.

use async_trait::async_trait;
use bytes::Bytes;
use contracts::ContractError;

/// One connection to a message bus
#[async_trait]
pub trait MessageProducer: Send {
    /// Publish one message to `topic`
    async fn produce(&mut self, topic: &str, payload: Bytes) -> Result<(), ContractError>;

    /// Flush pending messages and release the connection
    async fn close(&mut self) -> Result<(), ContractError>;
}

#[cfg(feature = "rdkafka")]
pub use self::rdkafka_producer::RdKafkaProducer;

#[cfg(feature = "rdkafka")]
mod rdkafka_producer {
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use contracts::ContractError;
    use rdkafka::config::ClientConfig;
    use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
    use rdkafka::util::Timeout;
    use tracing::{debug, instrument};

    use super::MessageProducer;
    use crate::sinks::kafka::{KafkaSinkConfig, KAFKA_SINK_NAME};

    /// How long a message may wait in the local queue when it is full
    const QUEUE_TIMEOUT: Duration = Duration::from_secs(5);
    /// Broker-side delivery timeout for one message
    const MESSAGE_TIMEOUT_MS: &str = "10000";
    /// Upper bound for the flush on close
    const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

    /// rdkafka-backed producer
    pub struct RdKafkaProducer {
        producer: FutureProducer,
    }

    impl RdKafkaProducer {
        /// Create the producer; brokers are contacted lazily on first send
        #[instrument(name = "kafka_producer_connect", skip(config), fields(brokers = ?config.brokers))]
        pub fn connect(config: &KafkaSinkConfig) -> Result<Self, ContractError> {
            let mut client = ClientConfig::new();
            client
                .set("bootstrap.servers", config.brokers.join(","))
                .set("message.timeout.ms", MESSAGE_TIMEOUT_MS)
                .set("compression.type", config.compression.as_str());

            if let Some(sasl) = &config.sasl {
                client
                    .set("security.protocol", "SASL_PLAINTEXT")
                    .set("sasl.mechanisms", "PLAIN")
                    .set("sasl.username", &sasl.user)
                    .set("sasl.password", &sasl.password);
            }

            let producer: FutureProducer = client
                .create()
                .map_err(|e| ContractError::sink_config(KAFKA_SINK_NAME, e.to_string()))?;

            debug!(topic = %config.topic, "Kafka producer created");
            Ok(Self { producer })
        }
    }

    #[async_trait]
    impl MessageProducer for RdKafkaProducer {
        async fn produce(&mut self, topic: &str, payload: Bytes) -> Result<(), ContractError> {
            let record = FutureRecord::<(), [u8]>::to(topic).payload(payload.as_ref());
            self.producer
                .send(record, Timeout::After(QUEUE_TIMEOUT))
                .await
                .map(|_| ())
                .map_err(|(e, _)| ContractError::delivery(KAFKA_SINK_NAME, e.to_string()))
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            // flush blocks the calling thread
            let producer = self.producer.clone();
            tokio::task::spawn_blocking(move || producer.flush(Timeout::After(FLUSH_TIMEOUT)))
                .await
                .map_err(|e| ContractError::delivery(KAFKA_SINK_NAME, e.to_string()))?
                .map_err(|e| ContractError::delivery(KAFKA_SINK_NAME, e.to_string()))
        }
    }
}
