// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster state prober: finds a prior deployment and reads its configuration.

use keel_adapters::manifest::workload::script_pod;
use keel_adapters::manifest::{EXTRACTOR_POD, INSPECTOR_POD};
use keel_adapters::{OrchestrationClient, ResourceKind};
use keel_core::volume::{database_mounts, migration_data_mount};
use keel_core::{
    parse_inspect_data, InspectedConfig, MigrationPayload, PullPolicy, VolumeMount, DATABASE_VOLUME,
    SERVER_DEPLOY_NAME,
};

use crate::env::Settings;
use crate::error::ReconcileError;
use crate::scripts;

/// What the prober found in the namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeResult {
    /// The database claim exists and is bound
    pub has_prior_deployment: bool,
    /// Image of the running server deployment, if any
    pub running_image: Option<String>,
}

pub struct Prober<'a, O> {
    orchestrator: &'a O,
    settings: &'a Settings,
}

impl<'a, O: OrchestrationClient> Prober<'a, O> {
    pub fn new(orchestrator: &'a O, settings: &'a Settings) -> Self {
        Self { orchestrator, settings }
    }

    pub async fn probe(&self, namespace: &str) -> Result<ProbeResult, ReconcileError> {
        let has_prior_deployment = self.orchestrator.volume_bound(namespace, DATABASE_VOLUME).await?;
        let running_image = self.orchestrator.running_image(namespace, SERVER_DEPLOY_NAME).await?;
        tracing::info!(
            %namespace,
            prior = has_prior_deployment,
            running = running_image.as_deref().unwrap_or("none"),
            "probed cluster state"
        );
        Ok(ProbeResult { has_prior_deployment, running_image })
    }

    /// Run the inspection script in `image` against the database volumes.
    pub async fn inspect(
        &self,
        namespace: &str,
        image: &str,
        pull_policy: PullPolicy,
    ) -> Result<InspectedConfig, ReconcileError> {
        tracing::info!(%namespace, %image, "inspecting image and volumes");
        let script = scripts::inspect()?;
        let output = self
            .run_pod(namespace, INSPECTOR_POD, image, pull_policy, &database_mounts(), &script)
            .await?;
        parse_inspect_data(&output).map_err(|source| ReconcileError::Parse {
            what: format!("inspection output of {image}"),
            source,
        })
    }

    /// Read the files the migration job left in the `migration-data` claim.
    pub async fn extract_migration_payload(
        &self,
        namespace: &str,
        image: &str,
        pull_policy: PullPolicy,
    ) -> Result<MigrationPayload, ReconcileError> {
        tracing::info!(%namespace, "extracting migration data");
        let script = scripts::extract()?;
        let output = self
            .run_pod(namespace, EXTRACTOR_POD, image, pull_policy, &[migration_data_mount()], &script)
            .await?;
        MigrationPayload::parse(&output).map_err(|source| ReconcileError::Parse {
            what: "migration data".to_string(),
            source,
        })
    }

    /// Run a one-shot pod and return its logs. The pod is deleted on every path.
    async fn run_pod(
        &self,
        namespace: &str,
        name: &str,
        image: &str,
        pull_policy: PullPolicy,
        mounts: &[VolumeMount],
        script: &str,
    ) -> Result<String, ReconcileError> {
        let pod = script_pod(namespace, name, image, pull_policy, mounts, script);
        let result = self.wait_and_read(namespace, name, &[pod]).await;

        if let Err(e) = self.orchestrator.delete(ResourceKind::Pod, namespace, name).await {
            tracing::warn!(%namespace, pod = %name, error = %e, "failed to delete pod");
        }
        result
    }

    async fn wait_and_read(
        &self,
        namespace: &str,
        name: &str,
        pod: &[keel_adapters::Resource],
    ) -> Result<String, ReconcileError> {
        self.orchestrator.apply(pod).await?;
        self.orchestrator
            .wait_for_ready(ResourceKind::Pod, namespace, name, self.settings.inspect_wait)
            .await?;
        Ok(self.orchestrator.get_logs(namespace, name).await?)
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
