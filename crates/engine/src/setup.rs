// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Setup executor: first-boot configuration inside the running server.

use keel_adapters::manifest::cert::db_secret;
use keel_adapters::{OrchestrationClient, RemoteExec};
use keel_core::{EffectiveConfig, ServerConfig, SERVER_APP};

use crate::error::ReconcileError;
use crate::scripts;

/// Environment of the setup script.
///
/// `overrides` replace entries with the same name and append the others.
pub fn setup_env(
    config: &ServerConfig,
    effective: &EffectiveConfig,
    overrides: &[(&str, &str)],
) -> Result<Vec<(String, String)>, ReconcileError> {
    let Some(db_password) = effective.db.password.as_deref() else {
        return Err(ReconcileError::precondition("the database password is required for setup"));
    };
    let Some(admin_password) = config.admin.password.as_deref() else {
        return Err(ReconcileError::precondition("the administrator password is required for setup"));
    };
    let subject = &config.ssl.subject;
    let port = effective.db.port.to_string();
    let cnames = subject.cnames.join(",");

    let mut env: Vec<(String, String)> = [
        ("MANAGER_USER", effective.db.user.as_str()),
        ("MANAGER_PASS", db_password),
        ("MANAGER_ADMIN_EMAIL", config.email.as_str()),
        ("MANAGER_MAIL_FROM", config.email_from.as_str()),
        ("MANAGER_DB_NAME", effective.db.name.as_str()),
        ("MANAGER_DB_HOST", "localhost"),
        ("MANAGER_DB_PORT", port.as_str()),
        ("LOCAL_DB", "Y"),
        ("UYUNI_FQDN", effective.fqdn.as_str()),
        ("CERT_O", subject.org.as_str()),
        ("CERT_OU", subject.ou.as_str()),
        ("CERT_CITY", subject.city.as_str()),
        ("CERT_STATE", subject.state.as_str()),
        ("CERT_COUNTRY", subject.country.as_str()),
        ("CERT_EMAIL", subject.email.as_str()),
        ("CERT_CNAMES", cnames.as_str()),
        ("ADMIN_USER", config.admin.login.as_str()),
        ("ADMIN_PASS", admin_password),
        ("ADMIN_FIRST_NAME", config.admin.first_name.as_str()),
        ("ADMIN_LAST_NAME", config.admin.last_name.as_str()),
        ("ADMIN_EMAIL", config.admin.email.as_str()),
        ("ORGANIZATION", config.organization.as_str()),
        ("TZ", effective.timezone.as_str()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in overrides {
        match env.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => env.push((key.to_string(), value.to_string())),
        }
    }
    Ok(env)
}

pub struct SetupExecutor<'a, E, O> {
    exec: &'a E,
    orchestrator: &'a O,
    namespace: &'a str,
}

impl<'a, E: RemoteExec, O: OrchestrationClient> SetupExecutor<'a, E, O> {
    pub fn new(exec: &'a E, orchestrator: &'a O, namespace: &'a str) -> Self {
        Self { exec, orchestrator, namespace }
    }

    /// Run the setup script once in the server container.
    pub async fn run_setup(
        &self,
        config: &ServerConfig,
        effective: &EffectiveConfig,
        overrides: &[(&str, &str)],
    ) -> Result<(), ReconcileError> {
        let env = setup_env(config, effective, overrides)?;
        let script = scripts::setup(&effective.fqdn)?;

        tracing::info!(namespace = %self.namespace, fqdn = %effective.fqdn, "running setup");
        let output = self.exec.exec(&script, &env).await?;
        if !output.success() {
            return Err(ReconcileError::SetupFailed {
                status: output.status,
                message: output.stderr.trim().to_string(),
            });
        }
        tracing::info!(namespace = %self.namespace, "setup completed");
        Ok(())
    }

    /// Run the setup; on failure stop the server workloads and return the
    /// setup error. On success store the database credentials.
    pub async fn run_with_rollback(
        &self,
        config: &ServerConfig,
        effective: &EffectiveConfig,
        overrides: &[(&str, &str)],
    ) -> Result<(), ReconcileError> {
        if let Err(err) = self.run_setup(config, effective, overrides).await {
            tracing::error!(namespace = %self.namespace, error = %err, "setup failed, stopping the server");
            if let Err(e) = self.orchestrator.scale_to(self.namespace, SERVER_APP, 0).await {
                tracing::error!(namespace = %self.namespace, error = %e, "failed to stop the server");
            }
            return Err(err);
        }
        self.store_db_credentials(effective).await
    }

    /// Store the database credentials; their secret marks the server as set up.
    pub async fn store_db_credentials(&self, effective: &EffectiveConfig) -> Result<(), ReconcileError> {
        let Some(password) = effective.db.password.as_deref() else {
            return Err(ReconcileError::precondition("the database password is unknown"));
        };
        self.orchestrator.apply(&[db_secret(self.namespace, &effective.db.user, password)]).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "setup_tests.rs"]
mod tests;
