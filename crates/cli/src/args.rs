// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command line surface.
//!
//! Every server flag is optional: a flag that is set overrides the value read
//! from the configuration file, one that is not leaves it alone.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use keel_core::{Lifecycle, PullPolicy, ServerConfig, VolumeConfig};

use crate::config::{read_file, ConfigError};

#[derive(Parser)]
#[command(name = "keel", version, about = "Deploy a Uyuni server on Kubernetes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Namespace of the server objects
    #[arg(long, short = 'n', global = true)]
    pub namespace: Option<String>,

    /// TOML configuration file; flags override its values
    #[arg(long, short = 'c', global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output (repeat for more)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install a new server, or bring an existing one up to date
    Install(InstallArgs),
    /// Upgrade an existing server in place
    Upgrade(UpgradeArgs),
    /// Copy a server from a source host and run it on the cluster
    Migrate(MigrateArgs),
}

#[derive(Args)]
pub struct InstallArgs {
    /// Fully qualified domain name of the server
    pub fqdn: String,
    #[command(flatten)]
    pub server: ServerFlags,
}

#[derive(Args)]
pub struct UpgradeArgs {
    /// Fully qualified domain name of the server
    pub fqdn: String,
    #[command(flatten)]
    pub server: ServerFlags,
}

#[derive(Args)]
pub struct MigrateArgs {
    /// Fully qualified domain name of the source server
    pub source_fqdn: String,
    #[command(flatten)]
    pub server: ServerFlags,
    #[command(flatten)]
    pub migration: MigrationFlags,
}

impl Command {
    pub fn lifecycle(&self) -> Lifecycle {
        match self {
            Command::Install(_) => Lifecycle::Install,
            Command::Upgrade(_) => Lifecycle::Upgrade,
            Command::Migrate(_) => Lifecycle::Migrate,
        }
    }

    /// FQDN given on the command line; the source host for a migration.
    pub fn fqdn(&self) -> &str {
        match self {
            Command::Install(args) => &args.fqdn,
            Command::Upgrade(args) => &args.fqdn,
            Command::Migrate(args) => &args.source_fqdn,
        }
    }

    /// Apply the flags of the subcommand on top of `config`.
    pub fn apply(&self, config: &mut ServerConfig) -> Result<(), ConfigError> {
        match self {
            Command::Install(args) => args.server.apply(config),
            Command::Upgrade(args) => args.server.apply(config),
            Command::Migrate(args) => {
                args.server.apply(config)?;
                args.migration.apply(config)
            }
        }
    }
}

/// Flags shared by every subcommand.
#[derive(Args, Default)]
pub struct ServerFlags {
    #[command(flatten)]
    pub image: ImageFlags,
    #[command(flatten)]
    pub db: DbFlags,
    #[command(flatten)]
    pub ssl: SslFlags,
    #[command(flatten)]
    pub admin: AdminFlags,
    #[command(flatten)]
    pub volumes: VolumeFlags,
    #[command(flatten)]
    pub side: SideServiceFlags,
    #[command(flatten)]
    pub helm: HelmFlags,

    /// Organization of the first user
    #[arg(long)]
    pub organization: Option<String>,
    /// Administrator email receiving notifications
    #[arg(long)]
    pub email: Option<String>,
    /// Sender address of notifications
    #[arg(long)]
    pub email_from: Option<String>,
    /// Timezone of the server container
    #[arg(long, value_name = "TZ")]
    pub timezone: Option<String>,
    /// Expose the java debug ports
    #[arg(long)]
    pub debug: bool,
}

impl ServerFlags {
    pub fn apply(&self, config: &mut ServerConfig) -> Result<(), ConfigError> {
        self.image.apply(config);
        self.db.apply(config);
        self.ssl.apply(config)?;
        self.admin.apply(config);
        self.volumes.apply(config);
        self.side.apply(config);
        self.helm.apply(config);
        set(&mut config.organization, &self.organization);
        set(&mut config.email, &self.email);
        set(&mut config.email_from, &self.email_from);
        set(&mut config.timezone, &self.timezone);
        config.debug |= self.debug;
        Ok(())
    }
}

#[derive(Args, Default)]
#[command(next_help_heading = "Image")]
pub struct ImageFlags {
    /// Registry of the server and side-service images
    #[arg(long)]
    pub registry: Option<String>,
    /// Server image name
    #[arg(long)]
    pub image: Option<String>,
    /// Tag of every image
    #[arg(long)]
    pub tag: Option<String>,
    /// Image pull policy (Always, IfNotPresent, Never)
    #[arg(long)]
    pub pull_policy: Option<PullPolicy>,
    /// Full reference of the PostgreSQL upgrade image
    #[arg(long, value_name = "IMAGE")]
    pub db_upgrade_image: Option<String>,
}

impl ImageFlags {
    fn apply(&self, config: &mut ServerConfig) {
        set(&mut config.image.registry, &self.registry);
        set(&mut config.image.name, &self.image);
        set(&mut config.image.tag, &self.tag);
        set(&mut config.image.pull_policy, &self.pull_policy);
        set_opt(&mut config.db_upgrade_image, &self.db_upgrade_image);
    }
}

#[derive(Args, Default)]
#[command(next_help_heading = "Database")]
pub struct DbFlags {
    #[arg(long)]
    pub db_user: Option<String>,
    #[arg(long)]
    pub db_password: Option<String>,
    #[arg(long)]
    pub db_name: Option<String>,
    #[arg(long)]
    pub db_port: Option<u16>,
}

impl DbFlags {
    fn apply(&self, config: &mut ServerConfig) {
        set(&mut config.db.user, &self.db_user);
        set_opt(&mut config.db.password, &self.db_password);
        set(&mut config.db.name, &self.db_name);
        set(&mut config.db.port, &self.db_port);
    }
}

#[derive(Args, Default)]
#[command(next_help_heading = "SSL")]
pub struct SslFlags {
    /// Extra DNS name of the server certificate (repeatable)
    #[arg(long = "ssl-cname", value_name = "NAME")]
    pub cnames: Vec<String>,
    #[arg(long)]
    pub ssl_country: Option<String>,
    #[arg(long)]
    pub ssl_state: Option<String>,
    #[arg(long)]
    pub ssl_city: Option<String>,
    #[arg(long)]
    pub ssl_org: Option<String>,
    #[arg(long)]
    pub ssl_ou: Option<String>,
    #[arg(long)]
    pub ssl_email: Option<String>,
    /// Password of the CA key
    #[arg(long)]
    pub ssl_password: Option<String>,
    /// Root CA certificate file
    #[arg(long, value_name = "FILE")]
    pub ssl_ca_root: Option<PathBuf>,
    /// CA private key file
    #[arg(long, value_name = "FILE")]
    pub ssl_ca_key: Option<PathBuf>,
    /// Server certificate file
    #[arg(long, value_name = "FILE")]
    pub ssl_server_cert: Option<PathBuf>,
    /// Server private key file
    #[arg(long, value_name = "FILE")]
    pub ssl_server_key: Option<PathBuf>,
}

impl SslFlags {
    fn apply(&self, config: &mut ServerConfig) -> Result<(), ConfigError> {
        let ssl = &mut config.ssl;
        if !self.cnames.is_empty() {
            ssl.subject.cnames = self.cnames.clone();
        }
        set(&mut ssl.subject.country, &self.ssl_country);
        set(&mut ssl.subject.state, &self.ssl_state);
        set(&mut ssl.subject.city, &self.ssl_city);
        set(&mut ssl.subject.org, &self.ssl_org);
        set(&mut ssl.subject.ou, &self.ssl_ou);
        set(&mut ssl.subject.email, &self.ssl_email);
        set_opt(&mut ssl.password, &self.ssl_password);
        load(&mut ssl.ca_root, self.ssl_ca_root.as_deref())?;
        load(&mut ssl.ca_key, self.ssl_ca_key.as_deref())?;
        load(&mut ssl.server_cert, self.ssl_server_cert.as_deref())?;
        load(&mut ssl.server_key, self.ssl_server_key.as_deref())?;
        Ok(())
    }
}

#[derive(Args, Default)]
#[command(next_help_heading = "Administrator")]
pub struct AdminFlags {
    #[arg(long)]
    pub admin_login: Option<String>,
    #[arg(long)]
    pub admin_password: Option<String>,
    #[arg(long)]
    pub admin_first_name: Option<String>,
    #[arg(long)]
    pub admin_last_name: Option<String>,
    #[arg(long)]
    pub admin_email: Option<String>,
}

impl AdminFlags {
    fn apply(&self, config: &mut ServerConfig) {
        set(&mut config.admin.login, &self.admin_login);
        set_opt(&mut config.admin.password, &self.admin_password);
        set(&mut config.admin.first_name, &self.admin_first_name);
        set(&mut config.admin.last_name, &self.admin_last_name);
        set(&mut config.admin.email, &self.admin_email);
    }
}

#[derive(Args, Default)]
#[command(next_help_heading = "Volumes")]
pub struct VolumeFlags {
    /// Default storage class of every claim
    #[arg(long)]
    pub volumes_class: Option<String>,
    #[arg(long, value_name = "SIZE")]
    pub volumes_database_size: Option<String>,
    #[arg(long, value_name = "CLASS")]
    pub volumes_database_class: Option<String>,
    #[arg(long, value_name = "SIZE")]
    pub volumes_packages_size: Option<String>,
    #[arg(long, value_name = "CLASS")]
    pub volumes_packages_class: Option<String>,
    #[arg(long, value_name = "SIZE")]
    pub volumes_www_size: Option<String>,
    #[arg(long, value_name = "CLASS")]
    pub volumes_www_class: Option<String>,
    #[arg(long, value_name = "SIZE")]
    pub volumes_cache_size: Option<String>,
    #[arg(long, value_name = "CLASS")]
    pub volumes_cache_class: Option<String>,
}

impl VolumeFlags {
    fn apply(&self, config: &mut ServerConfig) {
        let volumes = &mut config.volumes;
        set_opt(&mut volumes.class, &self.volumes_class);
        tune(&mut volumes.database, &self.volumes_database_size, &self.volumes_database_class);
        tune(&mut volumes.packages, &self.volumes_packages_size, &self.volumes_packages_class);
        tune(&mut volumes.www, &self.volumes_www_size, &self.volumes_www_class);
        tune(&mut volumes.cache, &self.volumes_cache_size, &self.volumes_cache_class);
    }
}

#[derive(Args, Default)]
#[command(next_help_heading = "Side services")]
pub struct SideServiceFlags {
    /// Replicas of the confidential computing attestation service
    #[arg(long)]
    pub coco_replicas: Option<u32>,
    #[arg(long)]
    pub coco_image: Option<String>,
    /// Replicas of the hub XML-RPC API
    #[arg(long)]
    pub hub_api_replicas: Option<u32>,
    #[arg(long)]
    pub hub_api_image: Option<String>,
}

impl SideServiceFlags {
    fn apply(&self, config: &mut ServerConfig) {
        set(&mut config.coco.replicas, &self.coco_replicas);
        set(&mut config.coco.image, &self.coco_image);
        set(&mut config.hub_api.replicas, &self.hub_api_replicas);
        set(&mut config.hub_api.image, &self.hub_api_image);
    }
}

#[derive(Args, Default)]
#[command(next_help_heading = "cert-manager")]
pub struct HelmFlags {
    #[arg(long, value_name = "NAMESPACE")]
    pub cert_manager_namespace: Option<String>,
    #[arg(long, value_name = "CHART")]
    pub cert_manager_chart: Option<String>,
    #[arg(long, value_name = "VERSION")]
    pub cert_manager_version: Option<String>,
    /// Extra helm values file
    #[arg(long, value_name = "FILE")]
    pub cert_manager_values: Option<String>,
}

impl HelmFlags {
    fn apply(&self, config: &mut ServerConfig) {
        let helm = &mut config.helm;
        set(&mut helm.cert_manager_namespace, &self.cert_manager_namespace);
        set(&mut helm.cert_manager_chart, &self.cert_manager_chart);
        set_opt(&mut helm.cert_manager_version, &self.cert_manager_version);
        set_opt(&mut helm.cert_manager_values, &self.cert_manager_values);
    }
}

#[derive(Args, Default)]
#[command(next_help_heading = "Migration")]
pub struct MigrationFlags {
    /// User connecting to the source host
    #[arg(long)]
    pub migration_user: Option<String>,
    /// SSH private key file
    #[arg(long, value_name = "FILE")]
    pub migration_ssh_key: Option<PathBuf>,
    /// SSH public key file
    #[arg(long, value_name = "FILE")]
    pub migration_ssh_public_key: Option<PathBuf>,
    /// SSH known_hosts file
    #[arg(long, value_name = "FILE")]
    pub migration_ssh_known_hosts: Option<PathBuf>,
    /// SSH client configuration file
    #[arg(long, value_name = "FILE")]
    pub migration_ssh_config: Option<PathBuf>,
    /// Synchronise the data without stopping the source server
    #[arg(long)]
    pub prepare: bool,
}

impl MigrationFlags {
    fn apply(&self, config: &mut ServerConfig) -> Result<(), ConfigError> {
        let source = &mut config.migration;
        set(&mut source.user, &self.migration_user);
        load(&mut source.ssh_key, self.migration_ssh_key.as_deref())?;
        load(&mut source.ssh_public_key, self.migration_ssh_public_key.as_deref())?;
        load(&mut source.ssh_known_hosts, self.migration_ssh_known_hosts.as_deref())?;
        load(&mut source.ssh_config, self.migration_ssh_config.as_deref())?;
        source.prepare |= self.prepare;
        Ok(())
    }
}

fn set<T: Clone>(target: &mut T, flag: &Option<T>) {
    if let Some(value) = flag {
        *target = value.clone();
    }
}

fn set_opt<T: Clone>(target: &mut Option<T>, flag: &Option<T>) {
    if flag.is_some() {
        target.clone_from(flag);
    }
}

fn tune(volume: &mut VolumeConfig, size: &Option<String>, class: &Option<String>) {
    set_opt(&mut volume.size, size);
    set_opt(&mut volume.class, class);
}

/// Replace `target` with the content of `path`, if given.
fn load(target: &mut Option<String>, path: Option<&Path>) -> Result<(), ConfigError> {
    if let Some(path) = path {
        *target = Some(read_file(path)?);
    }
    Ok(())
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
