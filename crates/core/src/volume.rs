// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Volume mounts of the server and its jobs.

use serde::{Deserialize, Serialize};

use crate::config::VolumesConfig;

/// Claim receiving the data synchronised from the migration source.
pub const MIGRATION_DATA_VOLUME: &str = "migration-data";

/// Secret holding the SSH material used to reach the migration source.
pub const MIGRATION_SSH_SECRET: &str = "uyuni-migration-ssh";

/// Size of claims without a configured size.
pub const DEFAULT_VOLUME_SIZE: &str = "10Mi";

/// What backs a mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeSource {
    /// Persistent volume claim named after the mount.
    Claim,
    Secret(String),
    ConfigMap(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    pub source: VolumeSource,
    /// Requested claim size (e.g. `100Gi`)
    pub size: Option<String>,
    /// Storage class of the claim
    pub class: Option<String>,
}

impl VolumeMount {
    pub fn claim(name: &str, mount_path: &str) -> Self {
        Self {
            name: name.to_string(),
            mount_path: mount_path.to_string(),
            source: VolumeSource::Claim,
            size: None,
            class: None,
        }
    }

    pub fn secret(name: &str, mount_path: &str, secret: &str) -> Self {
        Self { source: VolumeSource::Secret(secret.to_string()), ..Self::claim(name, mount_path) }
    }

    pub fn config_map(name: &str, mount_path: &str, config_map: &str) -> Self {
        Self { source: VolumeSource::ConfigMap(config_map.to_string()), ..Self::claim(name, mount_path) }
    }

    pub fn with_size(mut self, size: &str) -> Self {
        self.size = Some(size.to_string());
        self
    }

    pub fn is_claim(&self) -> bool {
        self.source == VolumeSource::Claim
    }
}

/// Persistent claims mounted by the server container.
pub fn server_mounts() -> Vec<VolumeMount> {
    [
        ("var-pgsql", "/var/lib/pgsql"),
        ("var-cache", "/var/cache"),
        ("var-spacewalk", "/var/spacewalk"),
        ("var-log", "/var/log"),
        ("srv-salt", "/srv/salt"),
        ("srv-www", "/srv/www"),
        ("srv-tftpboot", "/srv/tftpboot"),
        ("srv-formulametadata", "/srv/formula_metadata"),
        ("srv-pillar", "/srv/pillar"),
        ("srv-susemanager", "/srv/susemanager"),
        ("srv-spacewalk", "/srv/spacewalk"),
        ("root", "/root"),
        ("etc-apache2", "/etc/apache2"),
        ("etc-rhn", "/etc/rhn"),
        ("etc-systemd-multi", "/etc/systemd/system/multi-user.target.wants"),
        ("etc-systemd-sockets", "/etc/systemd/system/sockets.target.wants"),
        ("etc-salt", "/etc/salt"),
        ("etc-tomcat", "/etc/tomcat"),
        ("etc-cobbler", "/etc/cobbler"),
        ("etc-sysconfig", "/etc/sysconfig"),
        ("etc-tls", "/etc/pki/tls"),
        ("run-salt-master", "/run/salt/master"),
    ]
    .into_iter()
    .map(|(name, path)| VolumeMount::claim(name, path))
    .collect()
}

/// Claims needed to read the database and its configuration.
pub fn database_mounts() -> Vec<VolumeMount> {
    vec![
        VolumeMount::claim("var-pgsql", "/var/lib/pgsql"),
        VolumeMount::claim("etc-rhn", "/etc/rhn"),
    ]
}

/// Claim receiving the migration data, mounted where the extractor reads it.
pub fn migration_data_mount() -> VolumeMount {
    VolumeMount::claim(MIGRATION_DATA_VOLUME, "/var/lib/uyuni-tools").with_size("100Mi")
}

/// Apply configured sizes and storage classes to claim mounts.
///
/// The per-volume class wins over the default class. Claims without a
/// configured size get [`DEFAULT_VOLUME_SIZE`].
pub fn tune_mounts(mounts: Vec<VolumeMount>, volumes: &VolumesConfig) -> Vec<VolumeMount> {
    mounts
        .into_iter()
        .map(|mut mount| {
            if !mount.is_claim() {
                return mount;
            }
            let tuned = match mount.name.as_str() {
                "var-pgsql" => Some(&volumes.database),
                "var-spacewalk" => Some(&volumes.packages),
                "srv-www" => Some(&volumes.www),
                "var-cache" => Some(&volumes.cache),
                _ => None,
            };
            if let Some(volume) = tuned {
                if let Some(size) = &volume.size {
                    mount.size = Some(size.clone());
                }
                mount.class = volume.class.clone();
            }
            if mount.class.is_none() {
                mount.class = volumes.class.clone();
            }
            if mount.size.is_none() {
                mount.size = Some(DEFAULT_VOLUME_SIZE.to_string());
            }
            mount
        })
        .collect()
}

#[cfg(test)]
#[path = "volume_tests.rs"]
mod tests;
