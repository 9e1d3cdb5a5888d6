// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell scripts run by the inspection pods and the jobs.

use minijinja::{context, Environment, UndefinedBehavior, Value};

use crate::error::ReconcileError;

const INSPECT_TEMPLATE: &str = include_str!("../templates/inspect.sh.j2");
const EXTRACT_TEMPLATE: &str = include_str!("../templates/extract.sh.j2");
const MIGRATE_TEMPLATE: &str = include_str!("../templates/migrate.sh.j2");
const DB_UPGRADE_TEMPLATE: &str = include_str!("../templates/db_upgrade.sh.j2");
const DB_FINALIZE_TEMPLATE: &str = include_str!("../templates/db_finalize.sh.j2");
const POST_UPGRADE_TEMPLATE: &str = include_str!("../templates/post_upgrade.sh.j2");
const SETUP_TEMPLATE: &str = include_str!("../templates/setup.sh.j2");

/// Server configuration file read by the inspection and post-upgrade scripts.
pub const RHN_CONF: &str = "/etc/rhn/rhn.conf";

/// First-boot setup tool shipped in the server image.
pub const SETUP_BIN: &str = "/usr/lib/susemanager/bin/mgr-setup";

/// Log written by the setup tool, tailed to stderr on failure.
pub const SETUP_LOG: &str = "/var/log/susemanager_setup.log";

/// Where the migration job leaves the files read by the extractor.
pub const MIGRATION_DATA_DIR: &str = "/var/lib/uyuni-tools";

/// Where the migration SSH secret is mounted.
pub const SSH_DIR: &str = "/etc/keel/ssh";

fn render(name: &str, template: &str, ctx: Value) -> Result<String, ReconcileError> {
    let wrap = |source| ReconcileError::Template { name: name.to_string(), source };
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.add_template(name, template).map_err(wrap)?;
    env.get_template(name).map_err(wrap)?.render(ctx).map_err(wrap)
}

/// Prints the inspected configuration as `key=value` lines.
pub fn inspect() -> Result<String, ReconcileError> {
    render(
        "inspect",
        INSPECT_TEMPLATE,
        context! { pg_data => "/var/lib/pgsql/data", rhn_conf => RHN_CONF },
    )
}

/// Prints the migration data directory as a YAML mapping of file name to content.
pub fn extract() -> Result<String, ReconcileError> {
    render("extract", EXTRACT_TEMPLATE, context! { data_dir => MIGRATION_DATA_DIR })
}

/// Options of the migration data transfer.
#[derive(Debug, Clone)]
pub struct MigrateScript<'a> {
    pub source_fqdn: &'a str,
    pub user: &'a str,
    /// Synchronise without stopping the source services
    pub prepare: bool,
    /// Whether the SSH secret is mounted
    pub ssh: bool,
    /// Directories copied from the source host
    pub directories: Vec<&'a str>,
}

pub fn migrate(script: &MigrateScript<'_>) -> Result<String, ReconcileError> {
    render(
        "migrate",
        MIGRATE_TEMPLATE,
        context! {
            source_fqdn => script.source_fqdn,
            user => script.user,
            prepare => script.prepare,
            ssh_dir => if script.ssh { SSH_DIR } else { "" },
            directories => script.directories,
            data_dir => MIGRATION_DATA_DIR,
        },
    )
}

pub fn db_upgrade(old_version: u32, new_version: u32) -> Result<String, ReconcileError> {
    render(
        "db-upgrade",
        DB_UPGRADE_TEMPLATE,
        context! { old_version => old_version, new_version => new_version },
    )
}

/// Autotune and reindex always run; the schema update only after an engine upgrade.
pub fn db_finalize(schema_update: bool, migration: bool) -> Result<String, ReconcileError> {
    render(
        "db-finalize",
        DB_FINALIZE_TEMPLATE,
        context! {
            run_autotune => true,
            run_reindex => true,
            run_schema_update => schema_update,
            migration => migration,
        },
    )
}

pub fn post_upgrade() -> Result<String, ReconcileError> {
    render("post-upgrade", POST_UPGRADE_TEMPLATE, context! { rhn_conf => RHN_CONF })
}

/// First-boot setup, run in the server container with the setup environment.
pub fn setup(fqdn: &str) -> Result<String, ReconcileError> {
    render(
        "setup",
        SETUP_TEMPLATE,
        context! { fqdn => fqdn, setup_bin => SETUP_BIN, log_file => SETUP_LOG },
    )
}

#[cfg(test)]
#[path = "scripts_tests.rs"]
mod tests;
