//! Message sink for forwarding parsed messages to the broker.
//!
//! The bridge loop only sees the [`MessageSink`] trait; the Kafka producer
//! lives behind it, and tests substitute [`mock::MockSink`].

use async_trait::async_trait;
use rdkafka::error::KafkaError;

use crate::wire::ParsedMessage;

pub mod kafka;
pub mod mock;

pub use kafka::KafkaSink;
pub use mock::MockSink;

/// Result type for sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors from producer creation and message forwarding.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to create producer: {0}")]
    Create(#[source] KafkaError),

    #[error("failed to produce message: {0}")]
    Produce(#[source] KafkaError),
}

/// Destination for validated messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Forward one message and wait (bounded) for its delivery outcome.
    ///
    /// Field bytes are copied at the boundary, so the caller's receive
    /// buffer may be reused immediately. Failures are contained: the caller
    /// logs them and moves on — at most one delivery attempt per message.
    async fn forward(&self, msg: &ParsedMessage<'_>) -> Result<()>;

    /// Flush outstanding deliveries at shutdown. Default: nothing queued.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}
