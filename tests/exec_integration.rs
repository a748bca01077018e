//! Integration tests for the execution core, using `sh` as a stand-in
//! for the zfs binary.

use std::io::Write;

use zfscmd::exec::{capture, run, run_with_input, run_with_output, Invocation, ZfsError};

fn sh(script: &str) -> Invocation {
    Invocation::new("sh").args(["-c", script])
}

#[tokio::test]
async fn test_run_success_ignores_stderr_noise() {
    let inv = sh("echo some warning >&2; exit 0");
    run(&inv).await.expect("status 0 must never raise");
}

#[tokio::test]
async fn test_run_classifies_dataset_not_found() {
    let inv = sh("echo \"cannot open 'tank/foo': dataset does not exist\" >&2; exit 1");
    let err = run(&inv).await.unwrap_err();
    match err {
        ZfsError::NotFound { name, stderr } => {
            assert_eq!(name, "tank/foo");
            assert_eq!(stderr, "cannot open 'tank/foo': dataset does not exist");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_run_classifies_already_exists() {
    let inv = sh("echo \"cannot create filesystem 'tank/foo': dataset already exists\" >&2; exit 1");
    let err = run(&inv).await.unwrap_err();
    assert!(matches!(err, ZfsError::AlreadyExists { .. }));
    assert_eq!(err.entity(), Some("tank/foo"));
}

#[tokio::test]
async fn test_run_unrecognized_failure_preserves_stderr() {
    let inv = sh("echo \"some unexpected explosion\" >&2; exit 2");
    let err = run(&inv).await.unwrap_err();
    match err {
        ZfsError::Failure { status, stderr } => {
            assert_eq!(status, 2);
            assert_eq!(stderr, "some unexpected explosion");
        }
        other => panic!("expected Failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_run_failure_without_stderr() {
    let inv = sh("exit 1");
    let err = run(&inv).await.unwrap_err();
    match err {
        ZfsError::Failure { status, stderr } => {
            assert_eq!(status, 1);
            assert!(stderr.is_empty());
        }
        other => panic!("expected Failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_drain_outlives_process_exit() {
    // A background subshell keeps the diagnostic pipe open and writes the
    // decisive line well after the parent has exited; classification must
    // still see it because the drain is joined to end-of-stream first.
    let inv = sh("( sleep 0.3; echo \"cannot destroy 'tank/a': dataset is busy\" >&2 ) & exit 1");
    let err = run(&inv).await.unwrap_err();
    match err {
        ZfsError::Busy { name, .. } => assert_eq!(name, "tank/a"),
        other => panic!("expected Busy, got {other:?}"),
    }
}

#[tokio::test]
async fn test_capture_parses_tab_delimited_rows() {
    let inv = sh("printf 'a\\tb\\tc\\nd\\te\\tf\\n'");
    let rows = capture(&inv).await.expect("capture");
    assert_eq!(
        rows,
        vec![
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            vec!["d".to_string(), "e".to_string(), "f".to_string()],
        ]
    );
}

#[tokio::test]
async fn test_capture_failure_returns_no_partial_rows() {
    let inv = sh(
        "printf 'x\\ty\\n'; echo \"cannot open 'tank/z': dataset does not exist\" >&2; exit 1",
    );
    let err = capture(&inv).await.unwrap_err();
    assert!(matches!(err, ZfsError::NotFound { .. }));
    assert_eq!(err.entity(), Some("tank/z"));
}

#[tokio::test]
async fn test_run_with_output_writes_file() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    let output = file.reopen().expect("reopen");

    let inv = sh("printf 'stream contents'");
    run_with_output(&inv, output).await.expect("run");

    let written = std::fs::read_to_string(file.path()).expect("read back");
    assert_eq!(written, "stream contents");
}

#[tokio::test]
async fn test_run_with_input_feeds_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "hello").expect("write");
    let input = file.reopen().expect("reopen");

    let inv = sh("grep -q hello");
    run_with_input(&inv, input).await.expect("run");
}

#[tokio::test]
async fn test_run_with_input_failure_classified() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "hello").expect("write");
    let input = file.reopen().expect("reopen");

    let inv = sh("grep -q absent");
    let err = run_with_input(&inv, input).await.unwrap_err();
    assert!(matches!(err, ZfsError::Failure { status: 1, .. }));
}
