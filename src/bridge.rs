//! The bridge loop: receive, parse, validate, forward.
//!
//! Single in-flight message by construction: each forward is awaited (with
//! its bounded delivery wait) before the next receive, so the broker sees
//! messages in exactly the order they were received.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::lifecycle::ShutdownFlag;
use crate::sink::MessageSink;
use crate::transport::{Recv, Transport, TransportError};
use crate::wire::{self, BUFFER_SIZE, MAX_MESSAGE_SIZE};

/// Orchestrates one transport and one sink until shutdown.
pub struct Bridge {
    transport: Box<dyn Transport>,
    sink: Arc<dyn MessageSink>,
    shutdown: ShutdownFlag,
}

impl Bridge {
    pub fn new(
        transport: Box<dyn Transport>,
        sink: Arc<dyn MessageSink>,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            transport,
            sink,
            shutdown,
        }
    }

    /// Run until the shutdown flag is set or a fatal transport error occurs.
    ///
    /// The receive buffer is refilled each iteration and never retained;
    /// parsed fields borrow from it only until the forward completes.
    pub async fn run(mut self) -> Result<(), TransportError> {
        let mut buf = [0u8; BUFFER_SIZE];

        while !self.shutdown.is_shutdown() {
            match self.transport.recv(&mut buf[..MAX_MESSAGE_SIZE]).await {
                Ok(Recv::Timeout) => continue,
                Ok(Recv::Eof) => {
                    if self.shutdown.is_shutdown() {
                        break;
                    }
                    self.transport.reopen().await?;
                }
                Ok(Recv::Data(n)) => self.handle_message(&buf[..n]).await,
                Err(err) if err.is_fatal() => {
                    error!(error = %err, "Transport failed");
                    return Err(err);
                }
                Err(err) => {
                    warn!(error = %err, "Transport error, continuing");
                }
            }
        }

        info!("Shutting down");
        Ok(())
    }

    async fn handle_message(&self, raw: &[u8]) {
        info!(raw = %String::from_utf8_lossy(raw), "Received raw data");

        let msg = wire::parse(raw);
        if !msg.is_well_formed() {
            warn!("Invalid message format, expected key|header|message");
            return;
        }

        info!(
            key = %String::from_utf8_lossy(msg.key),
            header = %String::from_utf8_lossy(msg.header),
            bytes = msg.message.map(|m| m.len()).unwrap_or(0),
            "Parsed message"
        );

        if let Err(err) = self.sink.forward(&msg).await {
            error!(error = %err, "Failed to produce message");
        }
    }
}
