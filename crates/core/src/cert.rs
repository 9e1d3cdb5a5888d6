// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Certificate sourcing strategy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SslConfig;
use crate::migration::MigrationPayload;

/// Subject of a generated CA and server certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectFields {
    /// Extra DNS names for the server certificate
    pub cnames: Vec<String>,
    pub country: String,
    pub state: String,
    pub city: String,
    pub org: String,
    pub ou: String,
    pub email: String,
}

/// Certificate material that cannot be used as supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertError {
    #[error("the CA certificate is required to reuse a CA key")]
    MissingCaCertificate,
}

/// How the server obtains its TLS certificate. Chosen once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertStrategy {
    /// Third-party server certificate stored as-is; no issuer.
    UseExisting { cert: String, key: String, ca_root: Option<String> },
    /// Existing CA key turned into a cert-manager CA issuer.
    ReuseMigratedCa { key: String, cert: Option<String>, password: Option<String> },
    /// Fresh self-signed CA generated by cert-manager.
    GenerateNew(SubjectFields),
}

impl CertStrategy {
    /// Pick the strategy from operator-supplied material and the migration payload.
    ///
    /// Precedence: operator server pair, then any CA key (operator first),
    /// then the transferred server pair, then a generated CA.
    pub fn select(ssl: &SslConfig, payload: Option<&MigrationPayload>) -> Self {
        let payload_ca_cert = payload.and_then(|p| p.ca_cert.clone());
        let ca_root = ssl.ca_root.clone().or_else(|| payload_ca_cert.clone());

        if let (Some(cert), Some(key)) = (non_empty(&ssl.server_cert), non_empty(&ssl.server_key)) {
            return CertStrategy::UseExisting { cert, key, ca_root };
        }

        let ca_key = non_empty(&ssl.ca_key).or_else(|| payload.and_then(|p| non_empty(&p.ca_key)));
        if let Some(key) = ca_key {
            return CertStrategy::ReuseMigratedCa {
                key,
                cert: ca_root,
                password: non_empty(&ssl.password),
            };
        }

        if let Some((cert, key)) = payload.and_then(MigrationPayload::server_pair) {
            return CertStrategy::UseExisting {
                cert: cert.to_string(),
                key: key.to_string(),
                ca_root: payload_ca_cert,
            };
        }

        CertStrategy::GenerateNew(ssl.subject.clone())
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            CertStrategy::UseExisting { .. } => "use-existing",
            CertStrategy::ReuseMigratedCa { .. } => "reuse-migrated-ca",
            CertStrategy::GenerateNew(_) => "generate-new",
        }
    }

    /// Check that the selected material is complete enough to provision.
    pub fn validate(&self) -> Result<(), CertError> {
        match self {
            CertStrategy::ReuseMigratedCa { cert: None, .. } => Err(CertError::MissingCaCertificate),
            _ => Ok(()),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// Keep only the PEM blocks of a certificate file.
///
/// Certificates exported by openssl often carry a human-readable dump before
/// the `-----BEGIN` line; Kubernetes TLS secrets reject it.
pub fn strip_text_from_certificate(content: &str) -> String {
    let mut out = String::new();
    let mut inside = false;
    for line in content.lines() {
        if line.starts_with("-----BEGIN") {
            inside = true;
        }
        if inside {
            out.push_str(line);
            out.push('\n');
        }
        if line.starts_with("-----END") {
            inside = false;
        }
    }
    out
}

#[cfg(test)]
#[path = "cert_tests.rs"]
mod tests;
