//! Typed errors reported by the zfs execution core.

/// Error type for zfs command execution.
///
/// The dataset-shaped variants are produced by matching the tool's stderr
/// against known diagnostic phrasing; each carries the offending dataset or
/// snapshot name and the raw diagnostic line it was extracted from.
#[derive(thiserror::Error, Debug)]
pub enum ZfsError {
    /// The named dataset does not exist.
    #[error("dataset does not exist: '{name}'")]
    NotFound {
        /// Dataset name extracted from the diagnostic.
        name: String,
        /// Raw diagnostic line.
        stderr: String,
    },

    /// The named dataset already exists.
    #[error("dataset already exists: '{name}'")]
    AlreadyExists {
        /// Dataset name extracted from the diagnostic.
        name: String,
        /// Raw diagnostic line.
        stderr: String,
    },

    /// The named dataset is busy and cannot be destroyed.
    #[error("dataset is busy: '{name}'")]
    Busy {
        /// Dataset name extracted from the diagnostic.
        name: String,
        /// Raw diagnostic line.
        stderr: String,
    },

    /// The hold tag is not present on the named snapshot.
    #[error("no such tag on dataset '{name}'")]
    TagNotFound {
        /// Snapshot name extracted from the diagnostic.
        name: String,
        /// Raw diagnostic line.
        stderr: String,
    },

    /// The hold tag is already present on the named snapshot.
    #[error("tag already exists on dataset '{name}'")]
    TagExists {
        /// Snapshot name extracted from the diagnostic.
        name: String,
        /// Raw diagnostic line.
        stderr: String,
    },

    /// The command failed in a way the signature table does not recognize.
    #[error("zfs exited with status {status}: {stderr}")]
    Failure {
        /// Raw exit status; negative values are signal numbers on unix.
        status: i32,
        /// Last captured diagnostic line, empty if none was seen.
        stderr: String,
    },

    /// Conflicting stream-direction request at spawn time.
    #[error("invalid stream configuration: {0}")]
    InvalidStreams(&'static str),

    /// Operation on a process handle that already reported its final status.
    #[error("process handle already closed")]
    Closed,

    /// The process was spawned without a piped stdout.
    #[error("process stdout not available")]
    NoStdout,

    /// The process was spawned without a piped stdin.
    #[error("process stdin not available")]
    NoStdin,

    /// Tabular output did not match the expected column contract.
    #[error("unexpected output from zfs: {0}")]
    UnexpectedOutput(String),

    /// I/O error while spawning or talking to the child process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ZfsError {
    /// The dataset or snapshot name the error refers to, if known.
    #[must_use]
    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::NotFound { name, .. }
            | Self::AlreadyExists { name, .. }
            | Self::Busy { name, .. }
            | Self::TagNotFound { name, .. }
            | Self::TagExists { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The raw diagnostic text the error was classified from, if any.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::NotFound { stderr, .. }
            | Self::AlreadyExists { stderr, .. }
            | Self::Busy { stderr, .. }
            | Self::TagNotFound { stderr, .. }
            | Self::TagExists { stderr, .. }
            | Self::Failure { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}
