// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manifest builder: the objects the deployer applies.
//!
//! Built-in kinds are typed k8s-openapi objects; cert-manager and traefik
//! objects are JSON. Every builder is pure and returns [`Resource`]s ready for
//! [`OrchestrationClient::apply`](crate::OrchestrationClient::apply).
//!
//! - [`workload`]: script pods, jobs, the server and side-service deployments, services
//! - [`ingress`]: ingress routes, traefik TCP/UDP routes and middleware
//! - [`cert`]: TLS secrets, CA config map, issuers, credentials secrets

pub mod cert;
pub mod ingress;
pub mod workload;

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeClaimVolumeSource, SecretVolumeSource, Volume, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use keel_core::volume::DEFAULT_VOLUME_SIZE;
use keel_core::{VolumeMount, VolumeSource, SERVER_APP};

use crate::orchestration::Resource;

/// Label key of the component inside the application.
pub const COMPONENT_LABEL: &str = "app.kubernetes.io/component";

pub const SERVER_COMPONENT: &str = "server";
pub const COCO_COMPONENT: &str = "coco";
pub const HUB_API_COMPONENT: &str = "hub-api";

/// Short-lived pod reading the configuration of an image and its volumes.
pub const INSPECTOR_POD: &str = "uyuni-image-inspector";

/// Short-lived pod reading the data synchronised from a migration source.
pub const EXTRACTOR_POD: &str = "uyuni-data-extractor";

/// Labels of every object, with the component when there is one.
pub fn labels(component: Option<&str>) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::from([("app".to_string(), SERVER_APP.to_string())]);
    if let Some(component) = component {
        labels.insert(COMPONENT_LABEL.to_string(), component.to_string());
    }
    labels
}

pub(crate) fn meta(namespace: &str, name: &str, component: Option<&str>) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(labels(component)),
        ..Default::default()
    }
}

/// JSON metadata of a dynamic object.
pub(crate) fn json_meta(namespace: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "namespace": namespace,
        "labels": labels(None),
    })
}

/// One claim per claim-backed mount. Secret and config map mounts are skipped.
pub fn claims(namespace: &str, mounts: &[VolumeMount]) -> Vec<Resource> {
    mounts
        .iter()
        .filter(|m| m.is_claim())
        .map(|m| Resource::Claim(claim(namespace, m)))
        .collect()
}

fn claim(namespace: &str, mount: &VolumeMount) -> PersistentVolumeClaim {
    let size = mount.size.clone().unwrap_or_else(|| DEFAULT_VOLUME_SIZE.to_string());
    PersistentVolumeClaim {
        metadata: meta(namespace, &mount.name, None),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([("storage".to_string(), Quantity(size))])),
                ..Default::default()
            }),
            storage_class_name: mount.class.clone(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Pod volumes backing the mounts.
pub fn volumes(mounts: &[VolumeMount]) -> Vec<Volume> {
    mounts
        .iter()
        .map(|m| match &m.source {
            VolumeSource::Claim => Volume {
                name: m.name.clone(),
                persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                    claim_name: m.name.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            },
            VolumeSource::Secret(secret) => Volume {
                name: m.name.clone(),
                secret: Some(SecretVolumeSource {
                    secret_name: Some(secret.clone()),
                    default_mode: Some(0o600),
                    ..Default::default()
                }),
                ..Default::default()
            },
            VolumeSource::ConfigMap(config_map) => Volume {
                name: m.name.clone(),
                config_map: Some(ConfigMapVolumeSource {
                    name: config_map.clone(),
                    ..Default::default()
                }),
                ..Default::default()
            },
        })
        .collect()
}

/// Container mounts of the volumes built by [`volumes`].
pub fn volume_mounts(mounts: &[VolumeMount]) -> Vec<k8s_openapi::api::core::v1::VolumeMount> {
    mounts
        .iter()
        .map(|m| k8s_openapi::api::core::v1::VolumeMount {
            name: m.name.clone(),
            mount_path: m.mount_path.clone(),
            read_only: (!m.is_claim()).then_some(true),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
