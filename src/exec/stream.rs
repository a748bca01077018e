//! Streaming handles for bulk transfer commands.
//!
//! `zfs send` and `zfs receive` move whole dataset streams; buffering them
//! is out of the question. These handles return as soon as the process has
//! spawned and expose the primary data channel as an async pipe. Failure
//! is deliberately deferred: a transfer's error surfaces exactly once, at
//! [`SendStream::close`] / [`ReceiveStream::close`] (or an explicit
//! `wait`), never at spawn time.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::process::{ChildStdin, ChildStdout};

use crate::exec::process::{StdinMode, StdoutMode, ZfsProcess};
use crate::exec::{Invocation, ZfsError};

/// Read side of a bulk transfer: the caller consumes the child's stdout.
#[derive(Debug)]
pub struct SendStream {
    stdout: ChildStdout,
    process: ZfsProcess,
}

impl SendStream {
    /// Spawn the process and hand back its output pipe immediately.
    ///
    /// # Errors
    ///
    /// Returns `ZfsError::Io` if the process cannot be spawned.
    pub fn open(invocation: &Invocation) -> Result<Self, ZfsError> {
        let mut process = ZfsProcess::spawn(invocation, StdinMode::Null, StdoutMode::Piped)?;
        let stdout = process.take_stdout().ok_or(ZfsError::NoStdout)?;
        Ok(Self { stdout, process })
    }

    /// The OS process id, if the child is still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.process.id()
    }

    /// Wait for the process without closing the pipe first.
    ///
    /// # Errors
    ///
    /// Returns the typed error if the process failed.
    pub async fn wait(&mut self) -> Result<(), ZfsError> {
        self.process.wait().await
    }

    /// Close the pipe, wait for the process, and classify the outcome.
    ///
    /// # Errors
    ///
    /// Returns the typed error if the process failed.
    pub async fn close(self) -> Result<(), ZfsError> {
        let Self {
            stdout,
            mut process,
        } = self;
        drop(stdout);
        process.wait().await
    }
}

impl AsyncRead for SendStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}

/// Write side of a bulk transfer: the caller feeds the child's stdin.
///
/// The child's stdout is routed through the diagnostic drain, since
/// write-style commands emit verbose progress there.
#[derive(Debug)]
pub struct ReceiveStream {
    stdin: Option<ChildStdin>,
    process: ZfsProcess,
}

impl ReceiveStream {
    /// Spawn the process and hand back its input pipe immediately.
    ///
    /// # Errors
    ///
    /// Returns `ZfsError::Io` if the process cannot be spawned.
    pub fn open(invocation: &Invocation) -> Result<Self, ZfsError> {
        let mut process = ZfsProcess::spawn(invocation, StdinMode::Piped, StdoutMode::ToStderr)?;
        let stdin = process.take_stdin().ok_or(ZfsError::NoStdin)?;
        Ok(Self {
            stdin: Some(stdin),
            process,
        })
    }

    /// The OS process id, if the child is still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.process.id()
    }

    /// Close the pipe end so the child sees end-of-file, wait for it,
    /// and classify the outcome.
    ///
    /// # Errors
    ///
    /// Returns the typed error if the process failed; a failure that
    /// happened while the caller was still writing surfaces here.
    pub async fn close(self) -> Result<(), ZfsError> {
        let Self { stdin, mut process } = self;
        drop(stdin);
        process.wait().await
    }
}

impl AsyncWrite for ReceiveStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.stdin.as_mut() {
            Some(stdin) => Pin::new(stdin).poll_write(cx, buf),
            None => Poll::Ready(Err(closed_pipe())),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.stdin.as_mut() {
            Some(stdin) => Pin::new(stdin).poll_flush(cx),
            None => Poll::Ready(Err(closed_pipe())),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.stdin.as_mut() {
            Some(stdin) => match Pin::new(stdin).poll_shutdown(cx) {
                Poll::Ready(Ok(())) => {
                    self.stdin = None;
                    Poll::Ready(Ok(()))
                }
                other => other,
            },
            None => Poll::Ready(Ok(())),
        }
    }
}

fn closed_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "stream already shut down")
}
