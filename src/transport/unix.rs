//! Unix domain socket transport.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::net::UnixListener;
use tokio::time::timeout;
use tracing::{debug, info};

use super::{Recv, Result, Transport, TransportError, ACCEPT_TIMEOUT};

/// Stream socket server accepting one-shot requests.
pub struct UnixSocketTransport {
    listener: UnixListener,
    path: PathBuf,
}

impl UnixSocketTransport {
    /// Bind at `path`, removing any stale socket file first.
    pub fn bind(path: PathBuf) -> Result<Self> {
        if path.exists() {
            debug!(path = %path.display(), "Removing stale socket file");
            let _ = std::fs::remove_file(&path);
        }

        let listener = UnixListener::bind(&path).map_err(|source| TransportError::Bind {
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), transport = "unix", "Server listening");
        Ok(Self { listener, path })
    }
}

#[async_trait]
impl Transport for UnixSocketTransport {
    async fn recv(&mut self, buf: &mut [u8]) -> Result<Recv> {
        let accepted = match timeout(ACCEPT_TIMEOUT, self.listener.accept()).await {
            Err(_) => return Ok(Recv::Timeout),
            Ok(accepted) => accepted,
        };

        let (mut stream, _) = accepted.map_err(TransportError::Accept)?;
        debug!("Client connected");

        // One read per connection; the stream drops (closes) on return.
        match stream.read(buf).await {
            Ok(0) => Ok(Recv::Eof),
            Ok(n) => Ok(Recv::Data(n)),
            Err(source) => Err(TransportError::ClientRead(source)),
        }
    }

    fn cleanup_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
