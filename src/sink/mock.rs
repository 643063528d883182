//! Mock sink implementation for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MessageSink, Result, SinkError};
use crate::wire::ParsedMessage;

/// An owned copy of a forwarded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedMessage {
    pub key: Vec<u8>,
    pub header: Vec<u8>,
    pub payload: Vec<u8>,
}

/// Mock sink recording every forward and flush.
#[derive(Default)]
pub struct MockSink {
    forwarded: RwLock<Vec<ForwardedMessage>>,
    attempt_count: RwLock<usize>,
    flush_count: RwLock<usize>,
    fail_on_forward: RwLock<bool>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_forward(&self, fail: bool) {
        *self.fail_on_forward.write().await = fail;
    }

    pub async fn forwarded_count(&self) -> usize {
        self.forwarded.read().await.len()
    }

    /// Total forward calls, including ones that were told to fail.
    pub async fn attempt_count(&self) -> usize {
        *self.attempt_count.read().await
    }

    pub async fn take_forwarded(&self) -> Vec<ForwardedMessage> {
        std::mem::take(&mut *self.forwarded.write().await)
    }

    pub async fn flush_count(&self) -> usize {
        *self.flush_count.read().await
    }
}

#[async_trait]
impl MessageSink for MockSink {
    async fn forward(&self, msg: &ParsedMessage<'_>) -> Result<()> {
        *self.attempt_count.write().await += 1;
        if *self.fail_on_forward.read().await {
            return Err(SinkError::Produce(
                rdkafka::error::KafkaError::MessageProduction(
                    rdkafka::types::RDKafkaErrorCode::QueueFull,
                ),
            ));
        }
        self.forwarded.write().await.push(ForwardedMessage {
            key: msg.key.to_vec(),
            header: msg.header.to_vec(),
            payload: msg.message.unwrap_or_default().to_vec(),
        });
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        *self.flush_count.write().await += 1;
        Ok(())
    }
}
