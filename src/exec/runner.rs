//! High-level command execution: run to completion or capture output.
//!
//! Both entry points hide the diagnostic drain entirely; the caller sees
//! a completed command or a typed error, never the internal concurrency.

use std::fs::File;

use tokio::io::AsyncReadExt;

use crate::exec::process::{StdinMode, StdoutMode, ZfsProcess};
use crate::exec::{Invocation, ZfsError};

/// One line of tab-delimited output, split into fields.
///
/// Field count and meaning are the caller's column contract.
pub type Row = Vec<String>;

/// Run a command to completion.
///
/// Stdout is inherited; stderr is drained to the log.
///
/// # Errors
///
/// Returns the typed error for a recognized failure, `ZfsError::Failure`
/// otherwise.
pub async fn run(invocation: &Invocation) -> Result<(), ZfsError> {
    let mut process = ZfsProcess::spawn(invocation, StdinMode::Null, StdoutMode::Inherit)?;
    process.wait().await
}

/// Run a command feeding it input from an open file.
///
/// Write-style commands emit verbose progress on stdout, so stdout is
/// routed through the diagnostic drain.
///
/// # Errors
///
/// Returns the typed error for a recognized failure, `ZfsError::Failure`
/// otherwise.
pub async fn run_with_input(invocation: &Invocation, input: File) -> Result<(), ZfsError> {
    let mut process =
        ZfsProcess::spawn(invocation, StdinMode::File(input), StdoutMode::ToStderr)?;
    process.wait().await
}

/// Run a command writing its output to an open file.
///
/// # Errors
///
/// Returns the typed error for a recognized failure, `ZfsError::Failure`
/// otherwise.
pub async fn run_with_output(invocation: &Invocation, output: File) -> Result<(), ZfsError> {
    let mut process =
        ZfsProcess::spawn(invocation, StdinMode::Null, StdoutMode::File(output))?;
    process.wait().await
}

/// Run a command and parse its tab-delimited stdout into rows.
///
/// Output is read to end-of-stream before the exit status is classified;
/// on failure the typed error is returned and no partial rows leak out.
///
/// # Errors
///
/// Returns the typed error for a recognized failure, `ZfsError::Failure`
/// otherwise.
pub async fn capture(invocation: &Invocation) -> Result<Vec<Row>, ZfsError> {
    let mut process = ZfsProcess::spawn(invocation, StdinMode::Null, StdoutMode::Piped)?;
    let mut stdout = process.take_stdout().ok_or(ZfsError::NoStdout)?;

    let mut output = String::new();
    stdout.read_to_string(&mut output).await?;
    drop(stdout);

    process.wait().await?;
    Ok(parse_rows(&output))
}

/// Split tab-delimited text into rows, preserving record order.
fn parse_rows(output: &str) -> Vec<Row> {
    output
        .lines()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows_splits_on_tabs() {
        let rows = parse_rows("a\tb\tc\nd\te\tf\n");
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                vec!["d".to_string(), "e".to_string(), "f".to_string()],
            ]
        );
    }

    #[test]
    fn test_parse_rows_empty_output() {
        assert!(parse_rows("").is_empty());
    }

    #[test]
    fn test_parse_rows_preserves_empty_fields() {
        let rows = parse_rows("name\t\t-\n");
        assert_eq!(rows, vec![vec!["name", "", "-"]
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>()]);
    }

    #[test]
    fn test_parse_rows_single_column() {
        let rows = parse_rows("tank\ntank/home\n");
        assert_eq!(
            rows,
            vec![vec!["tank".to_string()], vec!["tank/home".to_string()]]
        );
    }
}
