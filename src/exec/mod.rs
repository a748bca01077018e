//! Execution core: spawn zfs commands, drain diagnostics, classify exits.

mod classify;
mod drain;
mod error;
mod invocation;
mod process;
mod runner;
mod stream;

pub use classify::classify_exit;
pub use drain::DrainLevel;
pub use error::ZfsError;
pub use invocation::Invocation;
pub use process::{StdinMode, StdoutMode, ZfsProcess};
pub use runner::{capture, run, run_with_input, run_with_output, Row};
pub use stream::{ReceiveStream, SendStream};
