//! Child process spawning with controlled stream redirection.
//!
//! [`ZfsProcess`] owns the child, its optional stdin/stdout pipe ends, and
//! the background stderr drain. Stderr is always captured internally; it
//! belongs to the drain for the handle's lifetime and is never handed to
//! the caller. A handle moves through Created -> Running -> Drained &
//! Exited -> Closed; once closed, every operation fails with
//! [`ZfsError::Closed`].

use std::fs::File;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::exec::classify::classify_exit;
use crate::exec::drain::{last_line_slot, read_last_line, Drain, DrainLevel, LastLine};
use crate::exec::{Invocation, ZfsError};

/// How the child's stdin is wired up.
#[derive(Debug)]
pub enum StdinMode {
    /// No input; the child reads end-of-file immediately.
    Null,
    /// Inherit the parent's stdin.
    Inherit,
    /// Open a pipe the caller writes into.
    Piped,
    /// Read input from an open file.
    File(File),
}

/// How the child's stdout is wired up.
#[derive(Debug)]
pub enum StdoutMode {
    /// Discard output.
    Null,
    /// Inherit the parent's stdout.
    Inherit,
    /// Open a pipe the caller reads from.
    Piped,
    /// Capture stdout through the diagnostic drain.
    ///
    /// Write-style commands such as `zfs receive -v` emit progress on
    /// stdout; this routes that output through the same logging path as
    /// stderr.
    ToStderr,
    /// Write output to an open file.
    File(File),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessState {
    Running,
    Closed,
}

/// A spawned zfs process with its diagnostic drain attached.
#[derive(Debug)]
pub struct ZfsProcess {
    child: Child,
    drains: Vec<Drain>,
    last_line: LastLine,
    state: ProcessState,
}

impl ZfsProcess {
    /// Spawn a child process for `invocation`.
    ///
    /// Stderr is always piped and drained in the background at a severity
    /// chosen from the invocation's verbose flag. The assembled command
    /// line is logged at DEBUG before spawning. The child is killed if
    /// the handle is dropped without being waited on.
    ///
    /// # Errors
    ///
    /// Returns `ZfsError::InvalidStreams` if both stdin and stdout are
    /// requested piped, or `ZfsError::Io` if spawning fails.
    pub fn spawn(
        invocation: &Invocation,
        stdin: StdinMode,
        stdout: StdoutMode,
    ) -> Result<Self, ZfsError> {
        if matches!(stdin, StdinMode::Piped) && matches!(stdout, StdoutMode::Piped) {
            return Err(ZfsError::InvalidStreams(
                "only one of stdin or stdout may be piped",
            ));
        }

        let level = if invocation.verbose() {
            DrainLevel::Info
        } else {
            DrainLevel::Debug
        };

        tracing::debug!(command = %invocation, "spawning");

        let mut cmd = Command::new(invocation.program());
        cmd.args(invocation.argv())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd.stdin(match stdin {
            StdinMode::Null => Stdio::null(),
            StdinMode::Inherit => Stdio::inherit(),
            StdinMode::Piped => Stdio::piped(),
            StdinMode::File(file) => Stdio::from(file),
        });

        let capture_stdout = matches!(stdout, StdoutMode::ToStderr);
        cmd.stdout(match stdout {
            StdoutMode::Null => Stdio::null(),
            StdoutMode::Inherit => Stdio::inherit(),
            StdoutMode::Piped | StdoutMode::ToStderr => Stdio::piped(),
            StdoutMode::File(file) => Stdio::from(file),
        });

        let mut child = cmd.spawn()?;

        let last_line = last_line_slot();
        let mut drains = Vec::with_capacity(2);
        if let Some(stderr) = child.stderr.take() {
            drains.push(Drain::spawn(stderr, level, last_line.clone()));
        }
        if capture_stdout {
            if let Some(out) = child.stdout.take() {
                drains.push(Drain::spawn(out, level, last_line.clone()));
            }
        }

        Ok(Self {
            child,
            drains,
            last_line,
            state: ProcessState::Running,
        })
    }

    /// The OS process id, if the child is still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Take ownership of the stdout pipe end.
    ///
    /// Only available after spawning with [`StdoutMode::Piped`], and only
    /// once.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Take ownership of the stdin pipe end.
    ///
    /// Only available after spawning with [`StdinMode::Piped`], and only
    /// once.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Drain diagnostics to end-of-stream, then wait for the child.
    ///
    /// Returns the exit code and the last diagnostic line observed. The
    /// drain is joined before the status is read, so the final line is
    /// never lost to a race. Signal termination is reported as the
    /// negated signal number on unix.
    ///
    /// # Errors
    ///
    /// Returns `ZfsError::Closed` if the handle already reported its
    /// final status, or `ZfsError::Io` if waiting fails.
    pub async fn finish(&mut self) -> Result<(i32, Option<String>), ZfsError> {
        if self.state == ProcessState::Closed {
            return Err(ZfsError::Closed);
        }

        for drain in self.drains.drain(..) {
            drain.join().await;
        }
        let status = self.child.wait().await?;
        self.state = ProcessState::Closed;

        Ok((exit_code(status), read_last_line(&self.last_line)))
    }

    /// Wait for the child and classify the outcome.
    ///
    /// # Errors
    ///
    /// Returns the typed error for a recognized failure, or
    /// `ZfsError::Failure` for any other nonzero exit.
    pub async fn wait(&mut self) -> Result<(), ZfsError> {
        let (status, last) = self.finish().await?;
        classify_exit(status, last.as_deref())
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| -sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_both_piped_is_rejected() {
        let inv = Invocation::new("sh").args(["-c", "true"]);
        let result = ZfsProcess::spawn(&inv, StdinMode::Piped, StdoutMode::Piped);
        assert!(matches!(result, Err(ZfsError::InvalidStreams(_))));
    }

    #[tokio::test]
    async fn test_finish_reports_status_and_last_line() {
        let inv = Invocation::new("sh").args(["-c", "echo one >&2; echo two >&2; exit 3"]);
        let mut process =
            ZfsProcess::spawn(&inv, StdinMode::Null, StdoutMode::Null).expect("spawn");
        let (status, last) = process.finish().await.expect("finish");
        assert_eq!(status, 3);
        assert_eq!(last.as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_finish_twice_is_lifecycle_error() {
        let inv = Invocation::new("sh").args(["-c", "exit 0"]);
        let mut process =
            ZfsProcess::spawn(&inv, StdinMode::Null, StdoutMode::Null).expect("spawn");
        process.finish().await.expect("first finish");
        let err = process.finish().await.unwrap_err();
        assert!(matches!(err, ZfsError::Closed));
    }

    #[tokio::test]
    async fn test_stdout_to_stderr_feeds_the_drain() {
        let inv = Invocation::new("sh").args(["-c", "echo progress on stdout; exit 0"]);
        let mut process =
            ZfsProcess::spawn(&inv, StdinMode::Null, StdoutMode::ToStderr).expect("spawn");
        // stdout belongs to the drain in this mode.
        assert!(process.take_stdout().is_none());
        let (status, last) = process.finish().await.expect("finish");
        assert_eq!(status, 0);
        assert_eq!(last.as_deref(), Some("progress on stdout"));
    }

    #[tokio::test]
    async fn test_take_stdout_only_once() {
        let inv = Invocation::new("sh").args(["-c", "true"]);
        let mut process =
            ZfsProcess::spawn(&inv, StdinMode::Null, StdoutMode::Piped).expect("spawn");
        assert!(process.take_stdout().is_some());
        assert!(process.take_stdout().is_none());
        process.wait().await.expect("wait");
    }
}
