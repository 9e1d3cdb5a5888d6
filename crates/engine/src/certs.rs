// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Certificate provisioner.
//!
//! Executes the [`CertStrategy`] chosen for the run. Strategies going through
//! cert-manager return the name of the CA issuer that the SSL ingress
//! references; that issuer is ready and its CA certificate is published in
//! the `uyuni-ca` config map before this returns.

use keel_adapters::manifest::cert::{
    ca_certificate, ca_config_map, ca_issuer, ca_secret, self_signed_issuer, server_cert_secret,
    CA_CERT_KEY, CA_ISSUER, CA_NAME,
};
use keel_adapters::{poll_until, HostTools, OrchestrationClient, ResourceKind};
use keel_core::{strip_text_from_certificate, CertError, CertStrategy, DeploymentTarget, HelmConfig, PullPolicy};

use crate::env::Settings;
use crate::error::ReconcileError;

/// Deployment whose presence means cert-manager is installed.
pub const CERT_MANAGER_WEBHOOK: &str = "cert-manager-webhook";

pub struct CertProvisioner<'a, O, T> {
    orchestrator: &'a O,
    tools: &'a T,
    settings: &'a Settings,
}

impl<'a, O: OrchestrationClient, T: HostTools> CertProvisioner<'a, O, T> {
    pub fn new(orchestrator: &'a O, tools: &'a T, settings: &'a Settings) -> Self {
        Self { orchestrator, tools, settings }
    }

    /// Provision the certificates; returns the issuer name, if any.
    pub async fn provision(
        &self,
        strategy: &CertStrategy,
        target: &DeploymentTarget,
        helm: &HelmConfig,
        pull_policy: PullPolicy,
    ) -> Result<Option<String>, ReconcileError> {
        let namespace = target.namespace.as_str();
        tracing::info!(%namespace, strategy = strategy.name(), "provisioning certificates");

        match strategy {
            CertStrategy::UseExisting { cert, key, ca_root } => {
                let cert = strip_text_from_certificate(cert);
                let ca_root = ca_root.as_deref().map(strip_text_from_certificate);
                let ca_cert = ca_root.as_deref().unwrap_or(&cert);
                self.orchestrator
                    .apply(&[
                        server_cert_secret(namespace, &cert, key, ca_root.as_deref()),
                        ca_config_map(namespace, ca_cert),
                    ])
                    .await?;
                return Ok(None);
            }
            CertStrategy::ReuseMigratedCa { key, cert, password } => {
                let Some(cert) = cert else {
                    return Err(CertError::MissingCaCertificate.into());
                };
                self.ensure_cert_manager(helm, pull_policy).await?;
                let rsa_key = self.tools.convert_ca_key(key, password.as_deref()).await?;
                let cert = strip_text_from_certificate(cert);
                self.orchestrator
                    .apply(&[ca_secret(namespace, &cert, &rsa_key), ca_issuer(namespace)])
                    .await?;
            }
            CertStrategy::GenerateNew(subject) => {
                self.ensure_cert_manager(helm, pull_policy).await?;
                self.orchestrator
                    .apply(&[
                        self_signed_issuer(namespace),
                        ca_certificate(namespace, &target.fqdn, subject),
                        ca_issuer(namespace),
                    ])
                    .await?;
            }
        }

        tracing::info!(%namespace, issuer = CA_ISSUER, "waiting for issuer");
        self.orchestrator
            .wait_for_ready(ResourceKind::Issuer, namespace, CA_ISSUER, self.settings.issuer_wait)
            .await?;
        self.publish_ca(namespace).await?;
        Ok(Some(CA_ISSUER.to_string()))
    }

    async fn ensure_cert_manager(&self, helm: &HelmConfig, pull_policy: PullPolicy) -> Result<(), ReconcileError> {
        let installed = self
            .orchestrator
            .exists(ResourceKind::Deployment, &helm.cert_manager_namespace, CERT_MANAGER_WEBHOOK)
            .await?;
        if installed {
            tracing::info!(namespace = %helm.cert_manager_namespace, "cert-manager already installed");
            return Ok(());
        }
        self.tools.install_cert_manager(helm, pull_policy).await?;
        Ok(())
    }

    /// Copy the CA certificate from the `uyuni-ca` secret to the config map,
    /// so the server trusts it without access to the CA key.
    async fn publish_ca(&self, namespace: &str) -> Result<(), ReconcileError> {
        let orchestrator = self.orchestrator;
        let ca_cert = poll_until(
            "CA certificate in secret uyuni-ca",
            self.settings.issuer_wait,
            self.settings.poll_interval,
            || async move { orchestrator.get_secret_data(namespace, CA_NAME, CA_CERT_KEY).await },
        )
        .await?;
        self.orchestrator.apply(&[ca_config_map(namespace, &ca_cert)]).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "certs_tests.rs"]
mod tests;
