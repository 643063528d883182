//! Loopback TCP transport.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, info};

use super::{Recv, Result, Transport, TransportError, ACCEPT_TIMEOUT};

/// TCP server with the same one-shot accept/read contract as the Unix socket
/// transport. Bound to loopback only; no filesystem artifact to clean up.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Bind to `127.0.0.1:{port}`.
    pub async fn bind(port: u16) -> Result<Self> {
        let addr = format!("127.0.0.1:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| TransportError::BindTcp {
                addr: addr.clone(),
                source,
            })?;

        info!(address = %addr, transport = "tcp", "Server listening");
        Ok(Self { listener })
    }

    /// The bound address (useful when binding port 0 in tests).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn recv(&mut self, buf: &mut [u8]) -> Result<Recv> {
        let accepted = match timeout(ACCEPT_TIMEOUT, self.listener.accept()).await {
            Err(_) => return Ok(Recv::Timeout),
            Ok(accepted) => accepted,
        };

        let (mut stream, peer) = accepted.map_err(TransportError::Accept)?;
        debug!(peer = %peer, "Client connected");

        match stream.read(buf).await {
            Ok(0) => Ok(Recv::Eof),
            Ok(n) => Ok(Recv::Data(n)),
            Err(source) => Err(TransportError::ClientRead(source)),
        }
    }
}
