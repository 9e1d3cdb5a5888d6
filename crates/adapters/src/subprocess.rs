// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host command execution with a deadline.

use std::process::{Output, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Deadline of quick probes such as `kubectl version`.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline of key conversion with openssl.
pub const OPENSSL_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline of the cert-manager chart installation, which waits for its pods.
pub const HELM_TIMEOUT: Duration = Duration::from_secs(600);

/// Deadline of a command run inside the server container.
pub const EXEC_TIMEOUT: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("{what}: cannot run command: {source}")]
    Spawn {
        what: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} timed out after {}s", after.as_secs())]
    TimedOut { what: String, after: Duration },
}

impl SubprocessError {
    /// Whether the program itself could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SubprocessError::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Run `cmd` to completion, capturing its output. The child is killed on timeout.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    what: &str,
) -> Result<Output, SubprocessError> {
    cmd.stdin(Stdio::null()).kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result.map_err(|source| SubprocessError::Spawn { what: what.to_string(), source }),
        Err(_) => Err(SubprocessError::TimedOut { what: what.to_string(), after: timeout }),
    }
}

/// Like [`run_with_timeout`], feeding `input` on stdin.
///
/// Used for secrets, which must not appear in the process arguments.
pub async fn run_with_input(
    mut cmd: Command,
    input: &[u8],
    timeout: Duration,
    what: &str,
) -> Result<Output, SubprocessError> {
    cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);

    let run = async {
        let mut child = cmd.spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input).await?;
            stdin.shutdown().await?;
        }
        child.wait_with_output().await
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(result) => result.map_err(|source| SubprocessError::Spawn { what: what.to_string(), source }),
        Err(_) => Err(SubprocessError::TimedOut { what: what.to_string(), after: timeout }),
    }
}

/// Last non-empty line of stderr, for error messages.
pub fn stderr_summary(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or_default().trim().to_string()
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
