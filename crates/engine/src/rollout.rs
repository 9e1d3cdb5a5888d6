// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workload rollout manager.
//!
//! Ingresses are applied before the server deployment: creating the SSL
//! ingress is what makes cert-manager issue the `uyuni-cert` secret the
//! deployment mounts.

use keel_adapters::manifest::cert::CERT_SECRET;
use keel_adapters::manifest::claims;
use keel_adapters::manifest::ingress::{https_redirect_middleware, ingresses, traefik_route};
use keel_adapters::manifest::workload::{
    coco_deployment, hub_api, hub_api_port, server_deployment, server_services, ServerParams,
    COCO_DEPLOY_NAME, HUB_API_DEPLOY_NAME,
};
use keel_adapters::{IngressKind, OrchestrationClient, Resource, ResourceKind};
use keel_core::{server_ports, EffectiveConfig, ImageConfig, VolumeMount, SERVER_DEPLOY_NAME};

use crate::env::Settings;
use crate::error::ReconcileError;

/// Everything the server rollout needs.
#[derive(Debug, Clone)]
pub struct ServerRollout {
    pub params: ServerParams,
    pub fqdn: String,
    /// CA issuer referenced by the SSL ingress
    pub issuer: Option<String>,
    pub ingress: IngressKind,
    /// Expose the hub API port through traefik
    pub hub_api: bool,
}

pub struct Rollout<'a, O> {
    orchestrator: &'a O,
    settings: &'a Settings,
}

impl<'a, O: OrchestrationClient> Rollout<'a, O> {
    pub fn new(orchestrator: &'a O, settings: &'a Settings) -> Self {
        Self { orchestrator, settings }
    }

    /// Create the missing claims; existing ones are left untouched.
    ///
    /// Returns the names of the created claims.
    pub async fn ensure_claims(
        &self,
        namespace: &str,
        mounts: &[VolumeMount],
    ) -> Result<Vec<String>, ReconcileError> {
        let mut missing = Vec::new();
        for claim in claims(namespace, mounts) {
            let exists = self
                .orchestrator
                .exists(ResourceKind::PersistentVolumeClaim, namespace, claim.name())
                .await?;
            if !exists {
                missing.push(claim);
            }
        }
        if !missing.is_empty() {
            self.orchestrator.apply(&missing).await?;
        }
        let created: Vec<String> = missing.iter().map(|c| c.name().to_string()).collect();
        tracing::info!(%namespace, created = created.len(), "storage claims ensured");
        Ok(created)
    }

    /// Ingresses, server deployment and services, then wait for a ready server pod.
    pub async fn deploy_server(&self, rollout: &ServerRollout) -> Result<(), ReconcileError> {
        let namespace = rollout.params.namespace.as_str();

        tracing::info!(%namespace, fqdn = %rollout.fqdn, ingress = %rollout.ingress, "creating ingresses");
        self.orchestrator
            .apply(&ingresses(namespace, &rollout.fqdn, rollout.issuer.as_deref(), rollout.ingress))
            .await?;

        // Best effort: some ingress controllers populate the secret later
        if let Err(e) = self
            .orchestrator
            .wait_for_ready(ResourceKind::Secret, namespace, CERT_SECRET, self.settings.cert_secret_wait)
            .await
        {
            tracing::warn!(%namespace, error = %e, "certificate secret not ready, continuing");
        }

        tracing::info!(%namespace, image = %rollout.params.image, "deploying server");
        let mut resources = vec![server_deployment(&rollout.params)];
        resources.extend(server_services(namespace, rollout.params.debug));
        self.orchestrator.apply(&resources).await?;

        if rollout.ingress == IngressKind::Traefik {
            self.orchestrator.apply(&traefik_routes(namespace, rollout.params.debug, rollout.hub_api)).await?;
        }

        self.orchestrator
            .wait_for_ready(ResourceKind::Deployment, namespace, SERVER_DEPLOY_NAME, self.settings.ready_wait)
            .await?;
        tracing::info!(%namespace, "server is running");
        Ok(())
    }

    /// Start the side services with replicas and return their deployment names.
    pub async fn start_side_services(
        &self,
        namespace: &str,
        image: &ImageConfig,
        coco_image: &str,
        hub_api_image: &str,
        effective: &EffectiveConfig,
    ) -> Result<Vec<String>, ReconcileError> {
        let mut resources = Vec::new();
        let mut started = Vec::new();

        if effective.coco_replicas > 0 {
            let reference = image.sibling(coco_image).reference();
            tracing::info!(%namespace, image = %reference, replicas = effective.coco_replicas, "starting coco");
            resources.push(coco_deployment(
                namespace,
                &reference,
                image.pull_policy,
                effective.coco_replicas,
                &effective.db,
            ));
            started.push(COCO_DEPLOY_NAME.to_string());
        }
        if effective.hub_api_replicas > 0 {
            let reference = image.sibling(hub_api_image).reference();
            tracing::info!(%namespace, image = %reference, replicas = effective.hub_api_replicas, "starting hub API");
            resources.extend(hub_api(namespace, &reference, image.pull_policy, effective.hub_api_replicas));
            started.push(HUB_API_DEPLOY_NAME.to_string());
        }

        if !resources.is_empty() {
            self.orchestrator.apply(&resources).await?;
        }
        Ok(started)
    }

    /// Wait until every named deployment has a ready pod.
    pub async fn wait_deployments(&self, namespace: &str, names: &[String]) -> Result<(), ReconcileError> {
        for name in names {
            self.orchestrator
                .wait_for_ready(ResourceKind::Deployment, namespace, name, self.settings.ready_wait)
                .await?;
        }
        Ok(())
    }
}

/// Traefik TCP/UDP routes of every exposed port plus the https redirect middleware.
pub fn traefik_routes(namespace: &str, debug: bool, hub_api: bool) -> Vec<Resource> {
    let mut ports = server_ports(debug);
    if hub_api {
        ports.push(hub_api_port());
    }
    let mut routes: Vec<Resource> = ports.iter().map(|port| traefik_route(namespace, port)).collect();
    routes.push(https_redirect_middleware(namespace));
    routes
}

#[cfg(test)]
#[path = "rollout_tests.rs"]
mod tests;
