// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job sequencer: runs the batch jobs in their fixed order.
//!
//! Each job is applied under its fixed name (replacing any previous run) and
//! waited on with its own policy. A failed job is never retried.

use keel_adapters::manifest::workload::job;
use keel_adapters::{OrchestrationClient, OrchestrationError};
use keel_core::volume::{database_mounts, migration_data_mount};
use keel_core::{
    JobDescriptor, JobKind, ServerConfig, Transition, VersionPair, VolumeMount, DATABASE_VOLUME,
};

use crate::error::ReconcileError;
use crate::scripts::{self, MigrateScript, SSH_DIR};

pub struct JobSequencer<'a, O> {
    orchestrator: &'a O,
    namespace: &'a str,
}

impl<'a, O: OrchestrationClient> JobSequencer<'a, O> {
    pub fn new(orchestrator: &'a O, namespace: &'a str) -> Self {
        Self { orchestrator, namespace }
    }

    /// Apply the job, replacing a previous one, and wait for it.
    pub async fn run(&self, descriptor: &JobDescriptor) -> Result<(), ReconcileError> {
        let name = descriptor.name();
        tracing::info!(namespace = %self.namespace, job = %name, wait = %descriptor.wait, "running job");
        self.orchestrator.apply(&[job(self.namespace, descriptor)]).await?;

        match self.orchestrator.wait_for_job(self.namespace, name, descriptor.wait).await {
            Ok(()) => {
                tracing::info!(job = %name, "job completed");
                Ok(())
            }
            Err(OrchestrationError::Failed { reason, .. }) => {
                Err(ReconcileError::JobFailed { job: name.to_string(), reason })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Jobs run on an existing deployment: schema upgrade (only on
    /// [`Transition::Upgrade`]), finalize, post-upgrade.
    pub async fn upgrade_sequence(
        &self,
        config: &ServerConfig,
        pair: VersionPair,
        transition: Transition,
        migration: bool,
    ) -> Result<Vec<JobKind>, ReconcileError> {
        let mut descriptors = Vec::new();
        if transition == Transition::Upgrade {
            descriptors.push(db_upgrade_job(config, pair)?);
        }
        descriptors.push(db_finalize_job(config, transition.schema_update_required(), migration)?);
        descriptors.push(post_upgrade_job(config)?);

        let mut ran = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            self.run(descriptor).await?;
            ran.push(descriptor.kind);
        }
        Ok(ran)
    }
}

/// Data transfer from the migration source, mounting every server claim.
pub fn migration_job(
    config: &ServerConfig,
    source_fqdn: &str,
    mounts: &[VolumeMount],
    ssh: bool,
) -> Result<JobDescriptor, ReconcileError> {
    let script = scripts::migrate(&MigrateScript {
        source_fqdn,
        user: &config.migration.user,
        prepare: config.migration.prepare,
        ssh,
        directories: mounts.iter().filter(|m| m.is_claim()).map(|m| m.mount_path.as_str()).collect(),
    })?;

    let mut job_mounts = mounts.to_vec();
    job_mounts.push(migration_data_mount());
    if ssh {
        job_mounts.push(VolumeMount::secret("ssh", SSH_DIR, keel_core::volume::MIGRATION_SSH_SECRET));
    }

    Ok(JobDescriptor::new(JobKind::Migration, config.image.reference(), config.image.pull_policy)
        .mounts(job_mounts)
        .script(script))
}

/// Image of the database upgrade job: configured, or derived from the server image.
pub fn db_upgrade_image(config: &ServerConfig, pair: VersionPair) -> String {
    match &config.db_upgrade_image {
        Some(image) if !image.is_empty() => image.clone(),
        _ => config
            .image
            .reference_with_suffix(&format!("-migration-{}-{}", pair.installed, pair.target)),
    }
}

pub fn db_upgrade_job(config: &ServerConfig, pair: VersionPair) -> Result<JobDescriptor, ReconcileError> {
    let image = db_upgrade_image(config, pair);
    tracing::info!(%image, from = pair.installed, to = pair.target, "upgrading PostgreSQL");
    let mounts = database_mounts().into_iter().filter(|m| m.name == DATABASE_VOLUME).collect();
    Ok(JobDescriptor::new(JobKind::DbUpgrade, image, config.image.pull_policy)
        .mounts(mounts)
        .script(scripts::db_upgrade(pair.installed, pair.target)?))
}

pub fn db_finalize_job(
    config: &ServerConfig,
    schema_update: bool,
    migration: bool,
) -> Result<JobDescriptor, ReconcileError> {
    Ok(JobDescriptor::new(JobKind::DbFinalize, config.image.reference(), config.image.pull_policy)
        .mounts(database_mounts())
        .script(scripts::db_finalize(schema_update, migration)?))
}

pub fn post_upgrade_job(config: &ServerConfig) -> Result<JobDescriptor, ReconcileError> {
    Ok(JobDescriptor::new(JobKind::PostUpgrade, config.image.reference(), config.image.pull_policy)
        .mounts(database_mounts())
        .script(scripts::post_upgrade()?))
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
