//! Named pipe (FIFO) transport.
//!
//! FIFOs have no poll timeout: open blocks until a writer connects, and a
//! read blocks until data arrives or every writer has closed (EOF). Reads
//! run on the blocking pool so the async runtime stays responsive, but the
//! bridge's shutdown latency in this mode is unbounded until the next write
//! or EOF.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use nix::sys::stat::Mode;
use nix::unistd::mkfifo;
use tracing::{debug, info};

use super::{Recv, Result, Transport, TransportError};

/// Reader end of a named pipe, recreated on EOF so new writers can connect.
pub struct FifoTransport {
    path: PathBuf,
    file: Arc<File>,
}

impl FifoTransport {
    /// Create the FIFO (mode 0666, existing pipe tolerated) and open it for
    /// reading. The open blocks until a writer connects.
    pub async fn open(path: PathBuf) -> Result<Self> {
        match mkfifo(&path, Mode::from_bits_truncate(0o666)) {
            Ok(()) => {}
            Err(nix::errno::Errno::EEXIST) => {
                debug!(path = %path.display(), "FIFO already exists");
            }
            Err(errno) => {
                return Err(TransportError::CreateFifo {
                    path,
                    source: errno.into(),
                })
            }
        }

        let file = open_blocking(&path)
            .await
            .map_err(|source| TransportError::OpenFifo {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), transport = "fifo", "Listening on FIFO");
        Ok(Self {
            path,
            file: Arc::new(file),
        })
    }
}

/// Open the pipe read-only on the blocking pool.
async fn open_blocking(path: &Path) -> std::io::Result<File> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || File::open(path))
        .await
        .map_err(std::io::Error::other)?
}

#[async_trait]
impl Transport for FifoTransport {
    async fn recv(&mut self, buf: &mut [u8]) -> Result<Recv> {
        let file = Arc::clone(&self.file);
        let capacity = buf.len();

        let (data, n) = tokio::task::spawn_blocking(move || {
            let mut tmp = vec![0u8; capacity];
            (&*file).read(&mut tmp).map(|n| (tmp, n))
        })
        .await
        .map_err(std::io::Error::other)
        .and_then(|res| res)
        .map_err(TransportError::FifoRead)?;

        if n == 0 {
            return Ok(Recv::Eof);
        }

        buf[..n].copy_from_slice(&data[..n]);
        Ok(Recv::Data(n))
    }

    /// All writers closed; reopen so the next writer can connect. Failure is
    /// fatal — there is no other way to keep receiving.
    async fn reopen(&mut self) -> Result<()> {
        debug!(path = %self.path.display(), "FIFO EOF, reopening");
        let file = open_blocking(&self.path)
            .await
            .map_err(|source| TransportError::Reopen {
                path: self.path.clone(),
                source,
            })?;
        self.file = Arc::new(file);
        Ok(())
    }

    fn cleanup_path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;

    async fn write_once(path: PathBuf, data: &'static [u8]) {
        tokio::task::spawn_blocking(move || {
            let mut writer = OpenOptions::new().write(true).open(path).unwrap();
            writer.write_all(data).unwrap();
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_read_then_eof_then_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("jr_kafka_test_fifo");

        let opening = tokio::spawn(FifoTransport::open(path.clone()));
        write_once(path.clone(), b"k|h|first").await;
        let mut transport = opening.await.unwrap().unwrap();

        // Pipe contents survive the writer closing; data comes before EOF.
        let mut buf = [0u8; 32];
        let recv = transport.recv(&mut buf).await.unwrap();
        assert_eq!(recv, Recv::Data(9));
        assert_eq!(&buf[..9], b"k|h|first");

        // Writer closed: EOF, then a reopen lets a second writer in.
        assert_eq!(transport.recv(&mut buf).await.unwrap(), Recv::Eof);
        let writing = write_once(path.clone(), b"k|h|second");
        let (reopened, ()) = tokio::join!(transport.reopen(), writing);
        reopened.unwrap();

        let recv = transport.recv(&mut buf).await.unwrap();
        assert_eq!(recv, Recv::Data(10));
        assert_eq!(&buf[..10], b"k|h|second");
    }

    #[tokio::test]
    async fn test_existing_fifo_tolerated() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("jr_kafka_test_fifo");
        mkfifo(&path, Mode::from_bits_truncate(0o666)).unwrap();

        let opening = tokio::spawn(FifoTransport::open(path.clone()));
        write_once(path.clone(), b"x").await;
        let transport = opening.await.unwrap().unwrap();
        assert_eq!(transport.cleanup_path(), Some(path.as_path()));
    }
}
