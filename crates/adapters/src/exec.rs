// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commands run inside the live server container.

use std::time::Duration;

use async_trait::async_trait;
use keel_core::SERVER_DEPLOY_NAME;
use thiserror::Error;

use crate::subprocess::{run_with_input, SubprocessError, EXEC_TIMEOUT};

/// Errors from remote execution. A command exiting non-zero is not an error.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("cannot reach the server container: {0}")]
    Connection(String),

    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
}

/// Exit status and captured output of a remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Connection to the server container
#[async_trait]
pub trait RemoteExec: Clone + Send + Sync + 'static {
    /// Run a shell script with extra environment variables.
    async fn exec(&self, script: &str, env: &[(String, String)]) -> Result<ExecOutput, ExecError>;
}

/// `kubectl exec` into the server deployment.
///
/// The script and its environment are sent on stdin so that credentials never
/// show up in process arguments.
#[derive(Clone, Debug)]
pub struct KubectlExec {
    namespace: String,
    timeout: Duration,
}

impl KubectlExec {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), timeout: EXEC_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Quote a value for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Script prefixed with `export` lines for the environment.
pub fn script_with_env(script: &str, env: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in env {
        out.push_str(&format!("export {}={}\n", key, shell_quote(value)));
    }
    out.push_str(script);
    out
}

#[async_trait]
impl RemoteExec for KubectlExec {
    async fn exec(&self, script: &str, env: &[(String, String)]) -> Result<ExecOutput, ExecError> {
        let mut cmd = tokio::process::Command::new("kubectl");
        cmd.args([
            "exec",
            "-i",
            "-n",
            &self.namespace,
            &format!("deploy/{SERVER_DEPLOY_NAME}"),
            "-c",
            SERVER_DEPLOY_NAME,
            "--",
            "sh",
            "-s",
        ]);

        tracing::debug!(namespace = %self.namespace, vars = env.len(), "running script in server container");
        let input = script_with_env(script, env);
        let output = run_with_input(cmd, input.as_bytes(), self.timeout, "kubectl exec").await?;

        Ok(ExecOutput {
            // Killed by a signal: no exit code
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ExecError, ExecOutput, RemoteExec};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded remote command
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ExecCall {
        pub script: String,
        pub env: Vec<(String, String)>,
    }

    impl ExecCall {
        pub fn env_value(&self, key: &str) -> Option<&str> {
            self.env.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
        }
    }

    #[derive(Default)]
    struct FakeExecState {
        calls: Vec<ExecCall>,
        output: ExecOutput,
        connection_error: Option<String>,
    }

    /// Fake remote execution for testing
    #[derive(Clone, Default)]
    pub struct FakeExec {
        inner: Arc<Mutex<FakeExecState>>,
    }

    impl FakeExec {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every command exit with `status`.
        pub fn with_status(self, status: i32, stderr: &str) -> Self {
            {
                let mut inner = self.inner.lock();
                inner.output.status = status;
                inner.output.stderr = stderr.to_string();
            }
            self
        }

        pub fn fail_connection(self, message: &str) -> Self {
            self.inner.lock().connection_error = Some(message.to_string());
            self
        }

        /// Get all recorded commands
        pub fn calls(&self) -> Vec<ExecCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl RemoteExec for FakeExec {
        async fn exec(&self, script: &str, env: &[(String, String)]) -> Result<ExecOutput, ExecError> {
            let mut inner = self.inner.lock();
            inner.calls.push(ExecCall { script: script.to_string(), env: env.to_vec() });
            if let Some(message) = &inner.connection_error {
                return Err(ExecError::Connection(message.clone()));
            }
            Ok(inner.output.clone())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecCall, FakeExec};

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
