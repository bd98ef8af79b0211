//! Pipe capture for child processes
//!
//! Each pipe gets its own reader task appending into one shared buffer, so
//! output read before a kill is still available afterwards.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

const CHUNK_SIZE: usize = 8192;

/// Output buffer shared between reader tasks
#[derive(Debug, Clone, Default)]
pub(super) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Spawn a task that copies `reader` into this buffer until EOF
    pub(super) fn spawn_reader<R>(&self, mut reader: R) -> JoinHandle<io::Result<()>>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = self.clone();
        tokio::spawn(async move {
            let mut chunk = vec![0u8; CHUNK_SIZE];
            loop {
                let n = reader.read(&mut chunk).await?;
                if n == 0 {
                    return Ok(());
                }
                buffer.append(&chunk[..n]);
            }
        })
    }

    fn append(&self, bytes: &[u8]) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
    }

    /// Take everything captured so far
    pub(super) fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Wait for reader tasks to hit EOF, giving up after `window`
///
/// A pipe can outlive the child when a grandchild inherited it. Readers still
/// running at the deadline are aborted; what they read is already buffered.
pub(super) async fn drain(readers: Vec<JoinHandle<io::Result<()>>>, window: Duration) {
    let deadline = tokio::time::Instant::now() + window;
    for mut reader in readers {
        match tokio::time::timeout_at(deadline, &mut reader).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => tracing::warn!(error = %e, "Output capture failed"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Output reader task panicked"),
            Err(_) => {
                tracing::warn!(
                    window_ms = window.as_millis() as u64,
                    "Output pipe still open after drain window, abandoning reader"
                );
                reader.abort();
            }
        }
    }
}
