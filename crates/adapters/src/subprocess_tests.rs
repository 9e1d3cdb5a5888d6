// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sh(script: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", script]);
    cmd
}

#[tokio::test]
async fn captures_output() {
    let output = run_with_timeout(sh("echo hello"), PROBE_TIMEOUT, "echo").await.unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\n");
}

#[tokio::test]
async fn reports_timeout() {
    let err = run_with_timeout(sh("sleep 5"), Duration::from_millis(50), "sleep").await.unwrap_err();
    assert!(matches!(err, SubprocessError::TimedOut { ref what, .. } if what == "sleep"));
}

#[tokio::test]
async fn missing_program_is_not_found() {
    let cmd = Command::new("keel-no-such-program");
    let err = run_with_timeout(cmd, PROBE_TIMEOUT, "missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn feeds_stdin() {
    let output = run_with_input(sh("tr a-z A-Z"), b"secret", PROBE_TIMEOUT, "tr").await.unwrap();
    assert_eq!(String::from_utf8_lossy(&output.stdout), "SECRET");
}

#[tokio::test]
async fn summary_is_last_stderr_line() {
    let output = run_with_timeout(sh("echo first >&2; echo 'last line' >&2; exit 3"), PROBE_TIMEOUT, "fail")
        .await
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(stderr_summary(&output), "last line");
}
