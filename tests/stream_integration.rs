//! Integration tests for the streaming handles, using `sh` as a stand-in
//! for the zfs binary.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use zfscmd::exec::{Invocation, ReceiveStream, SendStream, ZfsError};

fn sh(script: &str) -> Invocation {
    Invocation::new("sh").args(["-c", script])
}

#[tokio::test]
async fn test_send_stream_delivers_bytes_then_closes_clean() {
    let mut stream = SendStream::open(&sh("printf 'snapshot payload'")).expect("open");

    let mut payload = Vec::new();
    stream.read_to_end(&mut payload).await.expect("read");
    assert_eq!(payload, b"snapshot payload");

    stream.close().await.expect("close");
}

#[tokio::test]
async fn test_send_stream_failure_surfaces_at_close() {
    let script =
        "printf 'partial data'; echo \"cannot open 'tank/gone': dataset does not exist\" >&2; exit 1";
    let mut stream = SendStream::open(&sh(script)).expect("open");

    // The partial payload is readable; the failure is not observable yet.
    let mut payload = Vec::new();
    stream.read_to_end(&mut payload).await.expect("read");
    assert_eq!(payload, b"partial data");

    let err = stream.close().await.unwrap_err();
    assert!(matches!(err, ZfsError::NotFound { .. }));
    assert_eq!(err.entity(), Some("tank/gone"));
}

#[tokio::test]
async fn test_receive_stream_consumes_bytes_then_closes_clean() {
    let mut stream = ReceiveStream::open(&sh("cat >/dev/null")).expect("open");

    stream.write_all(b"incoming stream").await.expect("write");
    stream.flush().await.expect("flush");
    stream.close().await.expect("close");
}

#[tokio::test]
async fn test_receive_stream_failure_surfaces_no_later_than_close() {
    let script = "echo \"cannot open 'tank/foo': dataset does not exist\" >&2; exit 1";
    let mut stream = ReceiveStream::open(&sh(script)).expect("open");

    // Give the process time to die before writing; the write may fail
    // with a broken pipe or land in the buffer, but either way the typed
    // error must be reported by close.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let _ = stream.write_all(b"too late").await;

    let err = stream.close().await.unwrap_err();
    assert!(matches!(err, ZfsError::NotFound { .. }));
    assert_eq!(err.entity(), Some("tank/foo"));
}

#[tokio::test]
async fn test_receive_stream_close_signals_end_of_file() {
    // wc -c exits only after stdin reaches end-of-file, so a clean close
    // proves the pipe end was released.
    let mut stream = ReceiveStream::open(&sh("test \"$(wc -c)\" -eq 9")).expect("open");
    stream.write_all(b"123456789").await.expect("write");
    stream.close().await.expect("close");
}

#[tokio::test]
async fn test_send_stream_explicit_wait_reports_failure() {
    let script = "echo \"cannot destroy 'tank/busy': dataset is busy\" >&2; exit 1";
    let mut stream = SendStream::open(&sh(script)).expect("open");

    let err = stream.wait().await.unwrap_err();
    assert!(matches!(err, ZfsError::Busy { .. }));
    assert_eq!(err.entity(), Some("tank/busy"));
}
