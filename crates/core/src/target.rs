// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment target identity and lifecycle path.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of a fully qualified domain name.
const MAX_FQDN_LEN: usize = 253;

/// Maximum length of a single DNS label.
const MAX_LABEL_LEN: usize = 63;

/// Why a domain name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FqdnError {
    #[error("domain name is empty")]
    Empty,
    #[error("domain name {0} is longer than 253 characters")]
    TooLong(String),
    #[error("{0} is not fully qualified: at least two labels are required")]
    NotQualified(String),
    #[error("{fqdn} has an invalid label {label:?}")]
    InvalidLabel { fqdn: String, label: String },
}

/// Check that `fqdn` is a syntactically valid fully qualified domain name.
///
/// A single trailing dot (root label) is accepted.
pub fn validate_fqdn(fqdn: &str) -> Result<(), FqdnError> {
    let name = fqdn.strip_suffix('.').unwrap_or(fqdn);
    if name.is_empty() {
        return Err(FqdnError::Empty);
    }
    if name.len() > MAX_FQDN_LEN {
        return Err(FqdnError::TooLong(fqdn.to_string()));
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return Err(FqdnError::NotQualified(fqdn.to_string()));
    }

    for label in labels {
        let valid = !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(FqdnError::InvalidLabel {
                fqdn: fqdn.to_string(),
                label: label.to_string(),
            });
        }
    }
    Ok(())
}

/// Namespace and domain name under configuration. Immutable for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentTarget {
    pub namespace: String,
    pub fqdn: String,
}

impl DeploymentTarget {
    /// Build a target after validating the domain name.
    pub fn new(namespace: impl Into<String>, fqdn: impl Into<String>) -> Result<Self, FqdnError> {
        let fqdn = fqdn.into();
        validate_fqdn(&fqdn)?;
        Ok(Self { namespace: namespace.into(), fqdn })
    }

    /// Same namespace, different domain name.
    ///
    /// Used once the inspected configuration reports the authoritative FQDN.
    pub fn with_fqdn(&self, fqdn: impl Into<String>) -> Self {
        Self { namespace: self.namespace.clone(), fqdn: fqdn.into() }
    }
}

impl fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.fqdn)
    }
}

/// Which lifecycle path the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    /// Fresh install; proceeds as an upgrade if a prior deployment is found.
    Install,
    /// In-place upgrade; requires a prior deployment.
    Upgrade,
    /// Copy a server from an external source host, then upgrade in place.
    Migrate,
}

impl Lifecycle {
    pub fn is_migration(&self) -> bool {
        matches!(self, Lifecycle::Migrate)
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Lifecycle::Install => "install",
            Lifecycle::Upgrade => "upgrade",
            Lifecycle::Migrate => "migrate",
        })
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
