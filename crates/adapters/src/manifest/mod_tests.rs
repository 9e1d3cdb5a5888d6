// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use keel_core::{server_mounts, tune_mounts, VolumesConfig};

use super::*;

#[test]
fn labels_carry_app_and_component() {
    let labels = labels(Some(SERVER_COMPONENT));
    assert_eq!(labels.get("app").map(String::as_str), Some("uyuni"));
    assert_eq!(labels.get(COMPONENT_LABEL).map(String::as_str), Some("server"));
    assert_eq!(super::labels(None).len(), 1);
}

#[test]
fn claims_skip_secret_and_config_map_mounts() {
    let mounts = vec![
        VolumeMount::claim("var-pgsql", "/var/lib/pgsql").with_size("50Gi"),
        VolumeMount::secret("ssh", "/root/.ssh", "uyuni-migration-ssh"),
        VolumeMount::config_map("ca-cert", "/etc/pki/trust/anchors", "uyuni-ca"),
    ];
    let claims = claims("uyuni", &mounts);
    assert_eq!(claims.len(), 1);
    let Resource::Claim(claim) = &claims[0] else { panic!("expected a claim") };
    assert_eq!(claim.metadata.name.as_deref(), Some("var-pgsql"));
    assert_eq!(claim.metadata.namespace.as_deref(), Some("uyuni"));
    let spec = claim.spec.as_ref().unwrap();
    assert_eq!(spec.access_modes, Some(vec!["ReadWriteOnce".to_string()]));
    let requests = spec.resources.as_ref().unwrap().requests.as_ref().unwrap();
    assert_eq!(requests["storage"], Quantity("50Gi".into()));
}

#[test]
fn claim_without_size_gets_default() {
    let claims = claims("uyuni", &[VolumeMount::claim("etc-rhn", "/etc/rhn")]);
    let Resource::Claim(claim) = &claims[0] else { panic!("expected a claim") };
    let spec = claim.spec.as_ref().unwrap();
    let requests = spec.resources.as_ref().unwrap().requests.as_ref().unwrap();
    assert_eq!(requests["storage"], Quantity("10Mi".into()));
    assert_eq!(spec.storage_class_name, None);
}

#[test]
fn tuned_server_claims_carry_class() {
    let volumes_config = VolumesConfig { class: Some("longhorn".into()), ..Default::default() };
    let mounts = tune_mounts(server_mounts(), &volumes_config);
    let claims = claims("uyuni", &mounts);
    assert_eq!(claims.len(), mounts.len());
    for claim in &claims {
        let Resource::Claim(claim) = claim else { panic!("expected a claim") };
        assert_eq!(claim.spec.as_ref().unwrap().storage_class_name.as_deref(), Some("longhorn"));
    }
}

#[test]
fn volumes_follow_mount_sources() {
    let mounts = vec![
        VolumeMount::claim("var-pgsql", "/var/lib/pgsql"),
        VolumeMount::secret("ssh", "/root/.ssh", "uyuni-migration-ssh"),
        VolumeMount::config_map("ca-cert", "/etc/pki/trust/anchors", "uyuni-ca"),
    ];
    let volumes = volumes(&mounts);
    assert_eq!(
        volumes[0].persistent_volume_claim.as_ref().map(|c| c.claim_name.as_str()),
        Some("var-pgsql")
    );
    assert_eq!(
        volumes[1].secret.as_ref().and_then(|s| s.secret_name.as_deref()),
        Some("uyuni-migration-ssh")
    );
    assert_eq!(volumes[2].config_map.as_ref().map(|c| c.name.as_str()), Some("uyuni-ca"));

    let container_mounts = volume_mounts(&mounts);
    assert_eq!(container_mounts[0].mount_path, "/var/lib/pgsql");
    assert_eq!(container_mounts[0].read_only, None);
    assert_eq!(container_mounts[1].read_only, Some(true));
}
