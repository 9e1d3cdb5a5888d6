// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness: a fake cluster, server container and host tools that
//! persist across runs, so a spec can install and then upgrade.

pub use keel_adapters::{FakeExec, FakeOrchestrator, FakeTools, OrchestrationCall, Resource, ResourceKind};
pub use keel_core::test_support::{extractor_output, inspect_output};
pub use keel_core::{
    AdminConfig, DbConfig, InspectedConfig, JobKind, Lifecycle, ServerConfig, Transition, DATABASE_VOLUME,
    SERVER_DEPLOY_NAME,
};
pub use keel_engine::{Outcome, ReconcileDeps, ReconcileError, Reconciler, Request, Settings};

pub const NS: &str = "uyuni";
pub const FQDN: &str = "server.example.com";

/// Full server image reference for `tag`.
pub fn image(tag: &str) -> String {
    format!("registry.opensuse.org/uyuni/server:{tag}")
}

/// What the inspection script prints in the image of `release`, on a volume
/// holding PostgreSQL `current`, when the image ships PostgreSQL `shipped`.
pub fn release(release: &str, current: u32, shipped: u32) -> String {
    inspect_output(
        &InspectedConfig::builder()
            .product_release(Some(release.to_string()))
            .current_pg_version(current)
            .image_pg_version(shipped)
            .build(),
    )
}

/// Install configuration with both passwords, deploying `tag`.
pub fn config(tag: &str) -> ServerConfig {
    let mut config = ServerConfig {
        namespace: NS.to_string(),
        db: DbConfig { password: Some("dbpass".into()), ..Default::default() },
        admin: AdminConfig { password: Some("adminpass".into()), ..Default::default() },
        ..Default::default()
    };
    config.image.tag = tag.to_string();
    config
}

pub struct Cluster {
    pub orchestrator: FakeOrchestrator,
    pub exec: FakeExec,
    pub tools: FakeTools,
}

impl Cluster {
    pub fn new(orchestrator: FakeOrchestrator) -> Self {
        Self { orchestrator, exec: FakeExec::new(), tools: FakeTools::new() }
    }

    pub fn with_exec(mut self, exec: FakeExec) -> Self {
        self.exec = exec;
        self
    }

    pub async fn run(&self, lifecycle: Lifecycle, fqdn: &str, config: ServerConfig) -> Result<Outcome, ReconcileError> {
        let deps = ReconcileDeps {
            orchestrator: self.orchestrator.clone(),
            exec: self.exec.clone(),
            tools: self.tools.clone(),
        };
        let request = Request { lifecycle, fqdn: fqdn.to_string(), config };
        Reconciler::new(deps, Settings::default()).run(&request).await
    }

    pub async fn install(&self, tag: &str) -> Outcome {
        self.run(Lifecycle::Install, FQDN, config(tag)).await.expect("install should succeed")
    }

    pub async fn upgrade(&self, tag: &str) -> Result<Outcome, ReconcileError> {
        self.run(Lifecycle::Upgrade, FQDN, config(tag)).await
    }

    /// Image of the server deployment as last applied.
    pub fn server_image(&self) -> Option<String> {
        match self.orchestrator.object(ResourceKind::Deployment, NS, SERVER_DEPLOY_NAME)? {
            Resource::Deployment(deployment) => deployment
                .spec
                .and_then(|s| s.template.spec)
                .and_then(|s| s.containers.into_iter().next())
                .and_then(|c| c.image),
            _ => None,
        }
    }

    /// Jobs applied so far, in order.
    pub fn jobs(&self) -> Vec<String> {
        self.orchestrator.applied_names(ResourceKind::Job)
    }

    /// Forget the calls of earlier runs.
    pub fn next_run(&self) {
        self.orchestrator.clear_calls();
    }
}
