//! Kafka producer sink.
//!
//! One producer for the process lifetime. Each forward is a synchronous
//! round trip: enqueue plus a bounded wait for the delivery report, which
//! serializes throughput but keeps ordering and backpressure trivial.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use tracing::{debug, info};

use super::{MessageSink, Result, SinkError};
use crate::config::BrokerConfig;
use crate::wire::ParsedMessage;

/// Bound on the per-message delivery wait and the shutdown flush.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Forwards messages to a fixed topic through an rdkafka producer.
pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
    flushed: AtomicBool,
}

impl KafkaSink {
    /// Create the producer from broker properties. Failure is startup-fatal.
    pub fn new(broker: &BrokerConfig, topic: impl Into<String>) -> Result<Self> {
        let mut config = ClientConfig::new();
        for (key, value) in broker.iter() {
            config.set(key, value);
        }

        let producer: FutureProducer = config.create().map_err(SinkError::Create)?;
        let topic = topic.into();
        info!(topic = %topic, "Kafka producer created");

        Ok(Self {
            producer,
            topic,
            flushed: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl MessageSink for KafkaSink {
    async fn forward(&self, msg: &ParsedMessage<'_>) -> Result<()> {
        let payload = msg.message.unwrap_or_default();
        // The wire header is required and validated upstream but not
        // attached to the record; only key and payload go to the broker.
        let record = FutureRecord::to(&self.topic).key(msg.key).payload(payload);

        debug!(
            key = %String::from_utf8_lossy(msg.key),
            bytes = payload.len(),
            "Message queued for delivery"
        );

        match self.producer.send(record, DELIVERY_TIMEOUT).await {
            Ok((partition, offset)) => {
                info!(
                    topic = %self.topic,
                    partition,
                    offset,
                    "Message delivered"
                );
                Ok(())
            }
            Err((err, _)) => Err(SinkError::Produce(err)),
        }
    }

    /// Flush queued deliveries once; repeat calls are no-ops.
    async fn flush(&self) -> Result<()> {
        if self.flushed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.producer
            .flush(DELIVERY_TIMEOUT)
            .map_err(SinkError::Produce)
    }
}
