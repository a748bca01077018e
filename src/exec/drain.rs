//! Background draining of a child process's stderr.
//!
//! Each spawned process gets one drain task per captured diagnostic pipe.
//! The task reads the pipe line by line until end-of-stream, forwards each
//! line to the log, and keeps the most recent line for failure
//! classification. It never reports errors into the foreground; a read
//! failure simply ends the drain and classification proceeds with whatever
//! text was captured.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

/// Severity at which drained lines are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainLevel {
    /// Verbose transfer/mutation commands: progress is worth surfacing.
    Info,
    /// Everything else: stderr only matters on failure, which is already
    /// captured for classification.
    Debug,
}

/// Shared slot holding the most recent diagnostic line.
pub(crate) type LastLine = Arc<Mutex<Option<String>>>;

pub(crate) fn last_line_slot() -> LastLine {
    Arc::new(Mutex::new(None))
}

pub(crate) fn read_last_line(slot: &LastLine) -> Option<String> {
    slot.lock().map_or(None, |guard| guard.clone())
}

/// Handle to a running drain task.
#[derive(Debug)]
pub(crate) struct Drain {
    task: JoinHandle<()>,
}

impl Drain {
    /// Start draining `reader` in the background.
    ///
    /// Every line is trimmed of trailing whitespace, logged at `level`,
    /// and stored into `last`, overwriting the previous value.
    pub(crate) fn spawn<R>(reader: R, level: DrainLevel, last: LastLine) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let msg = line.trim_end().to_string();
                match level {
                    DrainLevel::Info => tracing::info!(target: "zfscmd::zfs", "{msg}"),
                    DrainLevel::Debug => tracing::debug!(target: "zfscmd::zfs", "{msg}"),
                }
                if let Ok(mut slot) = last.lock() {
                    *slot = Some(msg);
                }
            }
        });
        Self { task }
    }

    /// Wait for the drain to reach end-of-stream.
    ///
    /// This is the single synchronization point between the background
    /// reader and the foreground waiter; it must complete before the exit
    /// status is classified.
    pub(crate) async fn join(self) {
        let _ = self.task.await;
    }
}
