// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation engine.
//!
//! Drives one install, upgrade or migration from start to finish:
//!
//! 1. preconditions: kubectl, FQDN, passwords, certificate material, namespace
//! 2. migration only: data transfer from the source host, extraction and
//!    the certificate material check
//! 3. probe; with a prior deployment, inspection, sanity check and version gate
//! 4. scale down (engine upgrade only), storage claims, database jobs
//! 5. certificates, ingresses, server workload
//! 6. first-boot setup (rolled back on failure), side services
//!
//! An unsupported downgrade is rejected before any claim, job or scale change.

use keel_adapters::manifest::cert::{migration_ssh_secret, DB_SECRET};
use keel_adapters::manifest::workload::ServerParams;
use keel_adapters::{HostTools, OrchestrationClient, RemoteExec, ResourceKind};
use keel_core::volume::migration_data_mount;
use keel_core::{
    sanity_check, server_mounts, tune_mounts, CertStrategy, DeploymentTarget, EffectiveConfig,
    InspectedConfig, JobKind, Lifecycle, MigrationPayload, PullPolicy, ServerConfig, Transition,
    VersionPair, VolumeMount, SERVER_APP,
};

use crate::certs::CertProvisioner;
use crate::env::Settings;
use crate::error::ReconcileError;
use crate::jobs::{migration_job, JobSequencer};
use crate::probe::Prober;
use crate::rollout::{Rollout, ServerRollout};
use crate::setup::SetupExecutor;

/// One run requested by the operator.
#[derive(Debug, Clone)]
pub struct Request {
    pub lifecycle: Lifecycle,
    /// Server FQDN; the source host for a migration
    pub fqdn: String,
    pub config: ServerConfig,
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub lifecycle: Lifecycle,
    /// FQDN the server was deployed with
    pub fqdn: String,
    /// Database transition, when a prior deployment was found
    pub transition: Option<Transition>,
    /// cert-manager issuer referenced by the SSL ingress
    pub issuer: Option<String>,
    pub setup_ran: bool,
    /// Jobs run, in order
    pub jobs: Vec<JobKind>,
}

/// External collaborators of the engine.
pub struct ReconcileDeps<O, E, T> {
    pub orchestrator: O,
    pub exec: E,
    pub tools: T,
}

/// Version gate result for an existing deployment.
struct Gate {
    inspected: InspectedConfig,
    pair: VersionPair,
    transition: Transition,
}

pub struct Reconciler<O, E, T> {
    orchestrator: O,
    exec: E,
    tools: T,
    settings: Settings,
}

impl<O, E, T> Reconciler<O, E, T>
where
    O: OrchestrationClient,
    E: RemoteExec,
    T: HostTools,
{
    pub fn new(deps: ReconcileDeps<O, E, T>, settings: Settings) -> Self {
        Self { orchestrator: deps.orchestrator, exec: deps.exec, tools: deps.tools, settings }
    }

    pub async fn run(&self, request: &Request) -> Result<Outcome, ReconcileError> {
        let config = &request.config;
        let lifecycle = request.lifecycle;

        self.tools.check_kubectl().await?;
        let target = DeploymentTarget::new(config.namespace.as_str(), request.fqdn.as_str())?;
        if lifecycle == Lifecycle::Install {
            require_passwords(config)?;
        }
        // A migration only knows its certificate material after the transfer
        let operator_strategy = if lifecycle.is_migration() {
            None
        } else {
            Some(checked_strategy(config, None)?)
        };
        let namespace = target.namespace.as_str();
        tracing::info!(%namespace, fqdn = %target.fqdn, %lifecycle, "reconciling");
        self.orchestrator.ensure_namespace(namespace).await?;

        let mounts = tune_mounts(server_mounts(), &config.volumes);
        let rollout = Rollout::new(&self.orchestrator, &self.settings);
        let sequencer = JobSequencer::new(&self.orchestrator, namespace);
        let mut jobs = Vec::new();

        let payload = if lifecycle.is_migration() {
            let payload = self.transfer(&target, config, &mounts).await?;
            jobs.push(JobKind::Migration);
            Some(payload)
        } else {
            None
        };

        let strategy = match operator_strategy {
            Some(strategy) => strategy,
            None => checked_strategy(config, payload.as_ref())?,
        };

        let prober = Prober::new(&self.orchestrator, &self.settings);
        let probe = prober.probe(namespace).await?;
        if lifecycle == Lifecycle::Upgrade && !probe.has_prior_deployment {
            return Err(ReconcileError::precondition(format!(
                "no server to upgrade in namespace {namespace}"
            )));
        }

        let gate = if probe.has_prior_deployment {
            Some(self.gate(&prober, namespace, config, probe.running_image.as_deref()).await?)
        } else {
            None
        };

        if let Some(gate) = gate.as_ref().filter(|g| g.transition == Transition::Upgrade) {
            tracing::info!(
                %namespace,
                from = gate.pair.installed,
                to = gate.pair.target,
                "stopping the server for the database upgrade"
            );
            self.orchestrator.scale_to(namespace, SERVER_APP, 0).await?;
        }

        let effective = EffectiveConfig::merge(
            config,
            gate.as_ref().map(|g| &g.inspected),
            payload.as_ref(),
            &target.fqdn,
        );
        let target = target.with_fqdn(effective.fqdn.as_str());

        rollout.ensure_claims(namespace, &mounts).await?;

        if let Some(gate) = &gate {
            let ran = sequencer
                .upgrade_sequence(config, gate.pair, gate.transition, lifecycle.is_migration())
                .await?;
            jobs.extend(ran);
        }

        let issuer = CertProvisioner::new(&self.orchestrator, &self.tools, &self.settings)
            .provision(&strategy, &target, &config.helm, config.image.pull_policy)
            .await?;

        let ingress = self.orchestrator.detect_ingress().await?;
        rollout
            .deploy_server(&ServerRollout {
                params: ServerParams {
                    namespace: namespace.to_string(),
                    image: config.image.reference(),
                    pull_policy: config.image.pull_policy,
                    timezone: effective.timezone.clone(),
                    debug: effective.debug,
                    mounts: mounts.clone(),
                },
                fqdn: target.fqdn.clone(),
                issuer: issuer.clone(),
                ingress,
                hub_api: effective.hub_api_replicas > 0,
            })
            .await?;

        let setup_ran = self.setup(lifecycle, namespace, config, &effective, payload.is_some()).await?;

        let started = rollout
            .start_side_services(namespace, &config.image, &config.coco.image, &config.hub_api.image, &effective)
            .await?;
        rollout.wait_deployments(namespace, &started).await?;

        tracing::info!(%namespace, fqdn = %target.fqdn, %lifecycle, "server is ready");
        Ok(Outcome {
            lifecycle,
            fqdn: target.fqdn,
            transition: gate.map(|g| g.transition),
            issuer,
            setup_ran,
            jobs,
        })
    }

    /// Copy the source server into the claims and read back what it left.
    async fn transfer(
        &self,
        target: &DeploymentTarget,
        config: &ServerConfig,
        mounts: &[VolumeMount],
    ) -> Result<MigrationPayload, ReconcileError> {
        let namespace = target.namespace.as_str();
        tracing::info!(%namespace, source = %target.fqdn, "migrating server data");

        let mut claims = mounts.to_vec();
        claims.push(migration_data_mount());
        Rollout::new(&self.orchestrator, &self.settings).ensure_claims(namespace, &claims).await?;

        let ssh = match migration_ssh_secret(namespace, &config.migration) {
            Some(secret) => {
                self.orchestrator.apply(&[secret]).await?;
                true
            }
            None => false,
        };

        JobSequencer::new(&self.orchestrator, namespace)
            .run(&migration_job(config, &target.fqdn, mounts, ssh)?)
            .await?;

        Prober::new(&self.orchestrator, &self.settings)
            .extract_migration_payload(namespace, &config.image.reference(), config.image.pull_policy)
            .await
    }

    /// Inspect the target and running images and classify the database transition.
    async fn gate(
        &self,
        prober: &Prober<'_, O>,
        namespace: &str,
        config: &ServerConfig,
        running_image: Option<&str>,
    ) -> Result<Gate, ReconcileError> {
        let inspected = prober.inspect(namespace, &config.image.reference(), config.image.pull_policy).await?;
        let running = match running_image {
            // The running image is already on the node
            Some(image) => Some(prober.inspect(namespace, image, PullPolicy::Never).await?),
            None => None,
        };
        sanity_check(running.as_ref(), &inspected)?;

        let pair = VersionPair::new(inspected.current_pg_version, inspected.image_pg_version);
        let transition = pair.check()?;
        tracing::info!(
            %namespace,
            installed = pair.installed,
            target = pair.target,
            ?transition,
            "database version gate passed"
        );
        Ok(Gate { inspected, pair, transition })
    }

    /// Run the first-boot setup when needed; returns whether it ran.
    async fn setup(
        &self,
        lifecycle: Lifecycle,
        namespace: &str,
        config: &ServerConfig,
        effective: &EffectiveConfig,
        migrated: bool,
    ) -> Result<bool, ReconcileError> {
        let executor = SetupExecutor::new(&self.exec, &self.orchestrator, namespace);
        if migrated {
            // A migrated server is already set up
            executor.store_db_credentials(effective).await?;
            return Ok(false);
        }
        if lifecycle != Lifecycle::Install {
            return Ok(false);
        }
        if self.orchestrator.exists(ResourceKind::Secret, namespace, DB_SECRET).await? {
            tracing::info!(%namespace, "server already set up, skipping setup");
            return Ok(false);
        }
        executor.run_with_rollback(config, effective, &[("NO_SSL", "Y")]).await?;
        Ok(true)
    }
}

/// Select the certificate strategy and reject incomplete material.
fn checked_strategy(
    config: &ServerConfig,
    payload: Option<&MigrationPayload>,
) -> Result<CertStrategy, ReconcileError> {
    let strategy = CertStrategy::select(&config.ssl, payload);
    strategy.validate()?;
    Ok(strategy)
}

fn require_passwords(config: &ServerConfig) -> Result<(), ReconcileError> {
    if config.db.password.as_deref().filter(|p| !p.is_empty()).is_none() {
        return Err(ReconcileError::precondition("a database password is required"));
    }
    if config.admin.password.as_deref().filter(|p| !p.is_empty()).is_none() {
        return Err(ReconcileError::precondition("an administrator password is required"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
