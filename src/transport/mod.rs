//! Transport layer abstraction for receiving raw messages.
//!
//! Supports:
//! - Unix domain sockets: one-shot request per accepted connection (default)
//! - TCP: same contract, bound to loopback
//! - FIFO: a named pipe, reopened transparently when all writers close
//!
//! All three expose a single capability to the bridge loop: yield the next
//! raw buffer, or signal EOF/timeout/error.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{StartupConfig, TransportMode};

mod fifo;
mod tcp;
mod unix;

pub use fifo::FifoTransport;
pub use tcp::TcpTransport;
pub use unix::UnixSocketTransport;

/// How long socket transports wait for a connection before yielding, so the
/// shutdown flag is polled at least once per second.
pub const ACCEPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors from transport setup and receive paths.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind socket at {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind TCP socket at {addr}: {source}")]
    BindTcp {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to create FIFO at {path}: {source}")]
    CreateFifo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open FIFO at {path}: {source}")]
    OpenFifo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("client read failed: {0}")]
    ClientRead(#[source] io::Error),

    #[error("FIFO read failed: {0}")]
    FifoRead(#[source] io::Error),

    #[error("failed to reopen FIFO at {path}: {source}")]
    Reopen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Whether the bridge loop must terminate on this error.
    ///
    /// Accept and per-client read failures only lose one request; a FIFO
    /// read or reopen failure leaves no way to keep receiving.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Accept(_) | Self::ClientRead(_))
    }
}

/// Outcome of one receive call.
#[derive(Debug, PartialEq, Eq)]
pub enum Recv {
    /// `n` bytes were read into the buffer.
    Data(usize),
    /// The peer closed without sending (socket modes) or all writers closed
    /// (FIFO mode).
    Eof,
    /// No connection arrived within [`ACCEPT_TIMEOUT`]; re-check shutdown.
    Timeout,
}

/// A source of raw message buffers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Receive the next raw message into `buf`.
    async fn recv(&mut self, buf: &mut [u8]) -> Result<Recv>;

    /// Recreate the underlying descriptor after EOF. Only the FIFO transport
    /// does anything here; for sockets EOF is just the per-connection close.
    async fn reopen(&mut self) -> Result<()> {
        Ok(())
    }

    /// Filesystem artifact to remove at shutdown, if any.
    fn cleanup_path(&self) -> Option<&Path> {
        None
    }
}

/// Bind the transport selected by the startup configuration.
///
/// Failure here is startup-fatal: there is nothing to listen on.
pub async fn bind(config: &StartupConfig) -> Result<Box<dyn Transport>> {
    match config.mode {
        TransportMode::UnixSocket => Ok(Box::new(UnixSocketTransport::bind(
            config.socket_path(),
        )?)),
        TransportMode::Tcp => Ok(Box::new(TcpTransport::bind(config.port).await?)),
        TransportMode::Fifo => Ok(Box::new(FifoTransport::open(config.fifo_path()).await?)),
    }
}
