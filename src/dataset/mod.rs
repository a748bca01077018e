//! Dataset-level operations built on the execution core.
//!
//! Everything here is thin glue: each function assembles an argument
//! vector for one zfs subcommand and hands it to [`crate::exec`], which
//! owns spawning, diagnostic draining, and failure classification.

mod builders;
mod types;

pub use builders::{
    CreateOptions, DestroyOptions, FindOptions, ReceiveOptions, SendOptions, SnapshotOptions,
};
pub use types::{Dataset, DatasetKind, Property, Snapshot};

use std::fs::File;

use builders::verbose_enabled;

use crate::exec::{self, ReceiveStream, ZfsError};

/// List datasets under the given paths.
///
/// An empty `paths` slice lists from every pool root.
///
/// # Errors
///
/// Returns `ZfsError::NotFound` if a named path does not exist, or
/// another typed error reported by the tool.
pub async fn find(paths: &[&str], options: &FindOptions) -> Result<Vec<Dataset>, ZfsError> {
    let rows = exec::capture(&options.build(paths)).await?;
    rows.into_iter().map(Dataset::from_row).collect()
}

/// Open a single dataset by name.
///
/// # Errors
///
/// Returns `ZfsError::NotFound` if the dataset does not exist.
pub async fn open(name: &str) -> Result<Dataset, ZfsError> {
    find(&[name], &FindOptions::default().depth(0))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ZfsError::UnexpectedOutput(format!("empty listing for '{name}'")))
}

/// The root dataset of every imported pool.
///
/// # Errors
///
/// Propagates errors from the underlying listing command.
pub async fn root_datasets() -> Result<Vec<Dataset>, ZfsError> {
    find(&[], &FindOptions::default().depth(0)).await
}

/// Create a filesystem.
///
/// # Errors
///
/// Returns `ZfsError::AlreadyExists` if the dataset exists, or another
/// typed error reported by the tool.
pub async fn create(name: &str, options: &CreateOptions) -> Result<Dataset, ZfsError> {
    exec::run(&options.build(name)).await?;
    Ok(Dataset::new(name, DatasetKind::Filesystem))
}

/// Open a receive stream: bytes written to the handle flow into
/// `zfs receive`.
///
/// Returns as soon as the process has spawned; a failed receive surfaces
/// its typed error when the stream is closed.
///
/// # Errors
///
/// Returns `ZfsError::Io` if the process cannot be spawned.
pub fn receive(name: &str, options: &ReceiveOptions) -> Result<ReceiveStream, ZfsError> {
    ReceiveStream::open(&options.build(name, verbose_enabled()))
}

/// Receive a stream from an open file.
///
/// # Errors
///
/// Propagates the typed error reported by the tool.
pub async fn receive_from(
    name: &str,
    options: &ReceiveOptions,
    input: File,
) -> Result<(), ZfsError> {
    exec::run_with_input(&options.build(name, verbose_enabled()), input).await
}
