// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supplied configuration and the effective values derived from it.
//!
//! [`ServerConfig`] is what the operator passes in (config file and flags).
//! [`EffectiveConfig::merge`] is the only place where values extracted from an
//! existing deployment or a migration payload override it.

use serde::{Deserialize, Serialize};

use crate::cert::SubjectFields;
use crate::image::ImageConfig;
use crate::inspect::InspectedConfig;
use crate::migration::MigrationPayload;

/// Everything the operator supplies for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub namespace: String,
    pub image: ImageConfig,
    /// Full reference of the database upgrade image, instead of the derived one
    pub db_upgrade_image: Option<String>,
    pub db: DbConfig,
    pub ssl: SslConfig,
    pub admin: AdminConfig,
    pub organization: String,
    /// Administrator email receiving server notifications
    pub email: String,
    /// Sender address of server notifications
    pub email_from: String,
    pub timezone: String,
    /// Expose the java debug ports
    pub debug: bool,
    pub volumes: VolumesConfig,
    pub coco: SideServiceConfig,
    pub hub_api: SideServiceConfig,
    pub helm: HelmConfig,
    pub migration: MigrationSource,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            namespace: crate::DEFAULT_NAMESPACE.to_string(),
            image: ImageConfig::default(),
            db_upgrade_image: None,
            db: DbConfig::default(),
            ssl: SslConfig::default(),
            admin: AdminConfig::default(),
            organization: "Organization".to_string(),
            email: "admin@example.com".to_string(),
            email_from: "notifications@example.com".to_string(),
            timezone: "Etc/UTC".to_string(),
            debug: false,
            volumes: VolumesConfig::default(),
            coco: SideServiceConfig::named("server-attestation"),
            hub_api: SideServiceConfig::named("server-hub-xmlrpc-api"),
            helm: HelmConfig::default(),
            migration: MigrationSource::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub user: String,
    pub password: Option<String>,
    pub name: String,
    pub port: u16,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            user: "spacewalk".to_string(),
            password: None,
            name: "susemanager".to_string(),
            port: 5432,
        }
    }
}

/// TLS subject and material. Material fields hold PEM content, not paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    #[serde(flatten)]
    pub subject: SubjectFields,
    /// Password of the CA key
    pub password: Option<String>,
    pub ca_root: Option<String>,
    pub ca_key: Option<String>,
    pub server_cert: Option<String>,
    pub server_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub login: String,
    pub password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            login: "admin".to_string(),
            password: None,
            first_name: "Administrator".to_string(),
            last_name: "McAdmin".to_string(),
            email: "admin@example.com".to_string(),
        }
    }
}

/// Size and class of one tunable claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    pub size: Option<String>,
    pub class: Option<String>,
}

impl VolumeConfig {
    fn sized(size: &str) -> Self {
        Self { size: Some(size.to_string()), class: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumesConfig {
    /// Default storage class of every claim
    pub class: Option<String>,
    /// `var-pgsql`
    pub database: VolumeConfig,
    /// `var-spacewalk`, holding the synchronised repositories
    pub packages: VolumeConfig,
    /// `srv-www`, holding images and distributions
    pub www: VolumeConfig,
    /// `var-cache`
    pub cache: VolumeConfig,
}

impl Default for VolumesConfig {
    fn default() -> Self {
        Self {
            class: None,
            database: VolumeConfig::sized("50Gi"),
            packages: VolumeConfig::sized("100Gi"),
            www: VolumeConfig::sized("100Gi"),
            cache: VolumeConfig::sized("10Gi"),
        }
    }
}

/// Replicas and image name of an optional side service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SideServiceConfig {
    pub replicas: u32,
    /// Image name, sharing the server's registry and tag
    pub image: String,
}

impl SideServiceConfig {
    fn named(image: &str) -> Self {
        Self { replicas: 0, image: image.to_string() }
    }
}

/// cert-manager chart settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelmConfig {
    pub cert_manager_namespace: String,
    pub cert_manager_chart: String,
    pub cert_manager_version: Option<String>,
    /// Path to an extra values file passed to helm
    pub cert_manager_values: Option<String>,
}

impl Default for HelmConfig {
    fn default() -> Self {
        Self {
            cert_manager_namespace: "cert-manager".to_string(),
            cert_manager_chart: "oci://quay.io/jetstack/charts/cert-manager".to_string(),
            cert_manager_version: None,
            cert_manager_values: None,
        }
    }
}

/// How to reach the migration source host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationSource {
    pub user: String,
    /// Private key content
    pub ssh_key: Option<String>,
    pub ssh_public_key: Option<String>,
    pub ssh_known_hosts: Option<String>,
    pub ssh_config: Option<String>,
    /// Pre-sync and prepare only, without the final database copy
    pub prepare: bool,
}

impl Default for MigrationSource {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            ssh_key: None,
            ssh_public_key: None,
            ssh_known_hosts: None,
            ssh_config: None,
            prepare: false,
        }
    }
}

/// Values the rollout actually uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub fqdn: String,
    pub timezone: String,
    pub debug: bool,
    pub db: DbConfig,
    pub coco_replicas: u32,
    pub hub_api_replicas: u32,
}

impl EffectiveConfig {
    /// Merge supplied values with what was extracted from the cluster.
    ///
    /// The inspected configuration wins over the payload, which wins over the
    /// supplied configuration, for timezone, debug, database settings and FQDN.
    /// Hub replicas are raised to 1 when the payload reports a hub API.
    pub fn merge(
        supplied: &ServerConfig,
        inspected: Option<&InspectedConfig>,
        payload: Option<&MigrationPayload>,
        fqdn: &str,
    ) -> Self {
        let extracted: Vec<&InspectedConfig> =
            inspected.into_iter().chain(payload.map(|p| &p.inspected)).collect();
        let pick = |f: fn(&InspectedConfig) -> Option<&String>| -> Option<String> {
            extracted.iter().find_map(|c| f(c)).cloned()
        };

        let db_port = extracted.iter().find_map(|c| c.db_port).unwrap_or(supplied.db.port);
        let debug = supplied.debug || extracted.iter().any(|c| c.debug);

        let mut hub_api_replicas = supplied.hub_api.replicas;
        if payload.is_some_and(|p| p.inspected.has_hub_api) && hub_api_replicas == 0 {
            hub_api_replicas = 1;
        }

        Self {
            fqdn: pick(|c| c.fqdn.as_ref()).unwrap_or_else(|| fqdn.to_string()),
            timezone: pick(|c| c.timezone.as_ref()).unwrap_or_else(|| supplied.timezone.clone()),
            debug,
            db: DbConfig {
                user: pick(|c| c.db_user.as_ref()).unwrap_or_else(|| supplied.db.user.clone()),
                password: pick(|c| c.db_password.as_ref()).or_else(|| supplied.db.password.clone()),
                name: pick(|c| c.db_name.as_ref()).unwrap_or_else(|| supplied.db.name.clone()),
                port: db_port,
            },
            coco_replicas: supplied.coco.replicas,
            hub_api_replicas,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
