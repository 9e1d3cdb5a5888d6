// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Certificate material, cert-manager objects and credentials secrets.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::ByteString;
use keel_core::volume::MIGRATION_SSH_SECRET;
use keel_core::{MigrationSource, SubjectFields};
use serde_json::json;

use super::{json_meta, meta};
use crate::orchestration::{Resource, ResourceKind};

/// TLS secret of the server certificate.
pub const CERT_SECRET: &str = "uyuni-cert";

/// Name of the CA secret, its public config map and the generated CA certificate.
pub const CA_NAME: &str = "uyuni-ca";

/// Self-signed issuer bootstrapping a generated CA.
pub const SELF_SIGNED_ISSUER: &str = "uyuni-issuer";

/// CA issuer signing the server certificate.
pub const CA_ISSUER: &str = "uyuni-ca-issuer";

/// Database credentials; also marks a completed setup.
pub const DB_SECRET: &str = "db-credentials";

/// Key of the CA certificate in secrets and config maps.
pub const CA_CERT_KEY: &str = "ca.crt";

const TLS_SECRET_TYPE: &str = "kubernetes.io/tls";

fn secret(namespace: &str, name: &str, type_: Option<&str>, data: &[(&str, &str)]) -> Resource {
    Resource::Secret(Secret {
        metadata: meta(namespace, name, None),
        data: Some(
            data.iter()
                .map(|(k, v)| (k.to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        ),
        type_: type_.map(str::to_string),
        ..Default::default()
    })
}

/// `uyuni-cert` secret holding a third-party server certificate.
pub fn server_cert_secret(namespace: &str, cert: &str, key: &str, ca_root: Option<&str>) -> Resource {
    let mut data = vec![("tls.crt", cert), ("tls.key", key)];
    if let Some(ca) = ca_root {
        data.push((CA_CERT_KEY, ca));
    }
    secret(namespace, CERT_SECRET, Some(TLS_SECRET_TYPE), &data)
}

/// `uyuni-ca` config map exposing the CA certificate without its key.
pub fn ca_config_map(namespace: &str, ca_cert: &str) -> Resource {
    Resource::ConfigMap(ConfigMap {
        metadata: meta(namespace, CA_NAME, None),
        data: Some(BTreeMap::from([(CA_CERT_KEY.to_string(), ca_cert.to_string())])),
        ..Default::default()
    })
}

/// `uyuni-ca` secret holding an existing CA, read by the CA issuer.
pub fn ca_secret(namespace: &str, cert: &str, rsa_key: &str) -> Resource {
    secret(
        namespace,
        CA_NAME,
        Some(TLS_SECRET_TYPE),
        &[(CA_CERT_KEY, cert), ("tls.crt", cert), ("tls.key", rsa_key)],
    )
}

/// Issuer signing with the CA stored in the `uyuni-ca` secret.
pub fn ca_issuer(namespace: &str) -> Resource {
    issuer(namespace, CA_ISSUER, json!({ "ca": { "secretName": CA_NAME } }))
}

/// Self-signed issuer used only to sign the generated CA.
pub fn self_signed_issuer(namespace: &str) -> Resource {
    issuer(namespace, SELF_SIGNED_ISSUER, json!({ "selfSigned": {} }))
}

fn issuer(namespace: &str, name: &str, spec: serde_json::Value) -> Resource {
    Resource::Custom {
        kind: ResourceKind::Issuer,
        object: json!({
            "apiVersion": ResourceKind::Issuer.api_version(),
            "kind": ResourceKind::Issuer.to_string(),
            "metadata": json_meta(namespace, name),
            "spec": spec,
        }),
    }
}

/// Generated CA certificate, self-signed, stored in the `uyuni-ca` secret.
pub fn ca_certificate(namespace: &str, fqdn: &str, subject: &SubjectFields) -> Resource {
    let mut dns_names = vec![fqdn.to_string()];
    dns_names.extend(subject.cnames.iter().filter(|c| c.as_str() != fqdn).cloned());

    let mut subject_spec = serde_json::Map::new();
    for (key, value) in [
        ("countries", &subject.country),
        ("provinces", &subject.state),
        ("localities", &subject.city),
        ("organizations", &subject.org),
        ("organizationalUnits", &subject.ou),
    ] {
        if !value.is_empty() {
            subject_spec.insert(key.to_string(), json!([value]));
        }
    }

    let mut spec = json!({
        "isCA": true,
        "commonName": fqdn,
        "dnsNames": dns_names,
        "subject": subject_spec,
        "secretName": CA_NAME,
        "privateKey": { "algorithm": "ECDSA", "size": 256 },
        "issuerRef": {
            "name": SELF_SIGNED_ISSUER,
            "kind": "Issuer",
            "group": "cert-manager.io",
        },
    });
    if !subject.email.is_empty() {
        spec["emailAddresses"] = json!([subject.email]);
    }

    Resource::Custom {
        kind: ResourceKind::Certificate,
        object: json!({
            "apiVersion": ResourceKind::Certificate.api_version(),
            "kind": ResourceKind::Certificate.to_string(),
            "metadata": json_meta(namespace, CA_NAME),
            "spec": spec,
        }),
    }
}

/// Basic-auth secret with the database credentials.
pub fn db_secret(namespace: &str, user: &str, password: &str) -> Resource {
    secret(
        namespace,
        DB_SECRET,
        Some("kubernetes.io/basic-auth"),
        &[("username", user), ("password", password)],
    )
}

/// SSH material mounted by the migration job, if any was configured.
pub fn migration_ssh_secret(namespace: &str, source: &MigrationSource) -> Option<Resource> {
    let data: Vec<(&str, &str)> = [
        ("id_rsa", &source.ssh_key),
        ("id_rsa.pub", &source.ssh_public_key),
        ("known_hosts", &source.ssh_known_hosts),
        ("config", &source.ssh_config),
    ]
    .into_iter()
    .filter_map(|(k, v)| v.as_deref().map(|v| (k, v)))
    .collect();

    if data.is_empty() {
        return None;
    }
    Some(secret(namespace, MIGRATION_SSH_SECRET, None, &data))
}

#[cfg(test)]
#[path = "cert_tests.rs"]
mod tests;
