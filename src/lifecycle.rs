//! Shutdown signaling and resource teardown.
//!
//! No free-standing globals: the signal tasks only set an atomic flag that
//! the bridge loop polls, and every resource slated for cleanup lives in one
//! [`Teardown`] context reachable from every exit branch.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, error, info, warn};

use crate::sink::MessageSink;

/// Cooperative shutdown flag, polled by the bridge loop.
#[derive(Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Safe to call from any task, any number of times.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Install SIGINT/SIGTERM handlers that set the flag and nothing else.
pub fn install_signal_handlers(flag: &ShutdownFlag) -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let flag = flag.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received"),
            _ = sigterm.recv() => info!("SIGTERM received"),
        }
        flag.trigger();
    });

    Ok(())
}

/// Removes a socket/FIFO file at shutdown.
///
/// Removal is best-effort and idempotent: an already-missing file is a
/// no-op. Also fires on drop as a backstop.
pub struct CleanupGuard {
    path: PathBuf,
}

impl CleanupGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlink the tracked path.
    pub fn remove(&self) {
        if !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed transport file"),
            Err(err) => warn!(
                path = %self.path.display(),
                error = %err,
                "Failed to remove transport file"
            ),
        }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.remove();
    }
}

/// One teardown context: the producer handle plus at most one filesystem
/// artifact. `run` is idempotent so every exit branch may call it.
pub struct Teardown {
    sink: Arc<dyn MessageSink>,
    cleanup: Option<CleanupGuard>,
    ran: bool,
}

impl Teardown {
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        Self {
            sink,
            cleanup: None,
            ran: false,
        }
    }

    /// Track a socket/FIFO file for removal. Set once, after a successful
    /// bind/creation.
    pub fn set_cleanup(&mut self, guard: CleanupGuard) {
        self.cleanup = Some(guard);
    }

    /// Flush outstanding deliveries and remove the transport file.
    pub async fn run(&mut self) {
        if self.ran {
            return;
        }
        self.ran = true;

        if let Err(err) = self.sink.flush().await {
            error!(error = %err, "Flush failed during teardown");
        }
        if let Some(guard) = self.cleanup.take() {
            guard.remove();
        }
        info!("Teardown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MockSink;

    #[test]
    fn test_flag_starts_clear_and_latches() {
        let flag = ShutdownFlag::new();
        assert!(!flag.is_shutdown());
        flag.trigger();
        flag.trigger();
        assert!(flag.is_shutdown());
        assert!(flag.clone().is_shutdown());
    }

    #[test]
    fn test_cleanup_guard_removes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("jr_kafka_test_socket");
        std::fs::write(&path, b"").unwrap();

        let guard = CleanupGuard::new(&path);
        guard.remove();
        assert!(!path.exists());
        // Second removal (and the drop backstop) must not error.
        guard.remove();
    }

    #[test]
    fn test_cleanup_guard_missing_file_is_noop() {
        let guard = CleanupGuard::new("/nonexistent/jr_kafka_x_socket");
        guard.remove();
    }

    #[tokio::test]
    async fn test_teardown_runs_once() {
        let sink = Arc::new(MockSink::new());
        let mut teardown = Teardown::new(sink.clone());

        teardown.run().await;
        teardown.run().await;

        assert_eq!(sink.flush_count().await, 1);
    }

    #[tokio::test]
    async fn test_teardown_removes_tracked_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("jr_kafka_test_fifo");
        std::fs::write(&path, b"").unwrap();

        let sink = Arc::new(MockSink::new());
        let mut teardown = Teardown::new(sink);
        teardown.set_cleanup(CleanupGuard::new(&path));

        teardown.run().await;
        assert!(!path.exists());
    }
}
