// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host tools: kubectl presence, helm for cert-manager, openssl for CA keys.

use async_trait::async_trait;
use keel_core::{HelmConfig, PullPolicy};
use thiserror::Error;
use tokio::process::Command;

use crate::subprocess::{
    run_with_input, run_with_timeout, stderr_summary, SubprocessError, HELM_TIMEOUT, OPENSSL_TIMEOUT,
    PROBE_TIMEOUT,
};

/// Errors from host tools
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("install {0} before running this command")]
    Missing(String),

    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },

    #[error(transparent)]
    Subprocess(SubprocessError),
}

impl ToolError {
    fn from_subprocess(tool: &str, err: SubprocessError) -> Self {
        if err.is_not_found() {
            ToolError::Missing(tool.to_string())
        } else {
            ToolError::Subprocess(err)
        }
    }
}

/// Adapter for the tools run on the operator's host
#[async_trait]
pub trait HostTools: Clone + Send + Sync + 'static {
    /// Fail with [`ToolError::Missing`] unless `kubectl` can be run.
    async fn check_kubectl(&self) -> Result<(), ToolError>;

    /// Install or upgrade the cert-manager chart and wait for it.
    async fn install_cert_manager(&self, helm: &HelmConfig, pull_policy: PullPolicy) -> Result<(), ToolError>;

    /// Convert a possibly encrypted CA key into an unencrypted RSA PEM key.
    async fn convert_ca_key(&self, key: &str, password: Option<&str>) -> Result<String, ToolError>;
}

/// Host tools found on PATH
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTools;

impl SystemTools {
    pub fn new() -> Self {
        Self
    }
}

/// Arguments of `helm upgrade --install` for cert-manager.
pub fn cert_manager_args(helm: &HelmConfig, pull_policy: PullPolicy) -> Vec<String> {
    let mut args: Vec<String> = [
        "upgrade",
        "--install",
        "cert-manager",
        helm.cert_manager_chart.as_str(),
        "--namespace",
        helm.cert_manager_namespace.as_str(),
        "--create-namespace",
        "--set",
        "crds.enabled=true",
        "--wait",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push("--set".to_string());
    args.push(format!("image.pullPolicy={pull_policy}"));
    if let Some(version) = &helm.cert_manager_version {
        args.extend(["--version".to_string(), version.clone()]);
    }
    if let Some(values) = &helm.cert_manager_values {
        args.extend(["--values".to_string(), values.clone()]);
    }
    args
}

#[async_trait]
impl HostTools for SystemTools {
    async fn check_kubectl(&self) -> Result<(), ToolError> {
        let mut cmd = Command::new("kubectl");
        cmd.args(["version", "--client"]);
        run_with_timeout(cmd, PROBE_TIMEOUT, "kubectl version")
            .await
            .map_err(|e| ToolError::from_subprocess("kubectl", e))?;
        Ok(())
    }

    async fn install_cert_manager(&self, helm: &HelmConfig, pull_policy: PullPolicy) -> Result<(), ToolError> {
        tracing::info!(
            namespace = %helm.cert_manager_namespace,
            chart = %helm.cert_manager_chart,
            "installing cert-manager"
        );
        let mut cmd = Command::new("helm");
        cmd.args(cert_manager_args(helm, pull_policy));
        let output = run_with_timeout(cmd, HELM_TIMEOUT, "helm install cert-manager")
            .await
            .map_err(|e| ToolError::from_subprocess("helm", e))?;
        if !output.status.success() {
            return Err(ToolError::Failed { tool: "helm".to_string(), message: stderr_summary(&output) });
        }
        Ok(())
    }

    async fn convert_ca_key(&self, key: &str, password: Option<&str>) -> Result<String, ToolError> {
        let mut cmd = Command::new("openssl");
        cmd.args(["rsa", "-passin", "env:KEEL_CA_PASSWORD"]);
        cmd.env("KEEL_CA_PASSWORD", password.unwrap_or_default());
        let output = run_with_input(cmd, key.as_bytes(), OPENSSL_TIMEOUT, "openssl rsa")
            .await
            .map_err(|e| ToolError::from_subprocess("openssl", e))?;
        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: "openssl".to_string(),
                message: format!("cannot convert CA key: {}", stderr_summary(&output)),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{HostTools, ToolError};
    use async_trait::async_trait;
    use keel_core::{HelmConfig, PullPolicy};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded host tool invocation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ToolCall {
        CheckKubectl,
        InstallCertManager { namespace: String },
        ConvertCaKey { password: Option<String> },
    }

    #[derive(Default)]
    struct FakeToolsState {
        calls: Vec<ToolCall>,
        kubectl_missing: bool,
        helm_error: Option<String>,
    }

    /// Fake host tools for testing
    #[derive(Clone, Default)]
    pub struct FakeTools {
        inner: Arc<Mutex<FakeToolsState>>,
    }

    impl FakeTools {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn without_kubectl(self) -> Self {
            self.inner.lock().kubectl_missing = true;
            self
        }

        pub fn fail_helm(self, message: &str) -> Self {
            self.inner.lock().helm_error = Some(message.to_string());
            self
        }

        /// Get all recorded calls
        pub fn calls(&self) -> Vec<ToolCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl HostTools for FakeTools {
        async fn check_kubectl(&self) -> Result<(), ToolError> {
            let mut inner = self.inner.lock();
            inner.calls.push(ToolCall::CheckKubectl);
            if inner.kubectl_missing {
                return Err(ToolError::Missing("kubectl".to_string()));
            }
            Ok(())
        }

        async fn install_cert_manager(&self, helm: &HelmConfig, _pull_policy: PullPolicy) -> Result<(), ToolError> {
            let mut inner = self.inner.lock();
            inner
                .calls
                .push(ToolCall::InstallCertManager { namespace: helm.cert_manager_namespace.clone() });
            match &inner.helm_error {
                Some(message) => Err(ToolError::Failed { tool: "helm".to_string(), message: message.clone() }),
                None => Ok(()),
            }
        }

        /// Returns the key prefixed with `rsa:` so tests can trace it.
        async fn convert_ca_key(&self, key: &str, password: Option<&str>) -> Result<String, ToolError> {
            self.inner
                .lock()
                .calls
                .push(ToolCall::ConvertCaKey { password: password.map(str::to_string) });
            Ok(format!("rsa:{key}"))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTools, ToolCall};

#[cfg(test)]
#[path = "tools_tests.rs"]
mod tests;
