// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container image references.

use serde::{Deserialize, Serialize};

use crate::inspect::ParseError;

/// Kubernetes image pull policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullPolicy {
    Always,
    #[default]
    IfNotPresent,
    Never,
}

crate::string_enum! {
    PullPolicy, |s| ParseError::InvalidValue { key: "pull_policy".into(), value: s };
    Always => "Always",
    IfNotPresent => "IfNotPresent",
    Never => "Never",
}

/// Where an image lives and how to pull it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub registry: String,
    pub name: String,
    pub tag: String,
    pub pull_policy: PullPolicy,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            registry: "registry.opensuse.org/uyuni".to_string(),
            name: "server".to_string(),
            tag: "latest".to_string(),
            pull_policy: PullPolicy::default(),
        }
    }
}

impl ImageConfig {
    /// Full image reference: `registry/name:tag`.
    ///
    /// A name that already contains a `/` is taken as fully qualified and the
    /// registry is not prepended.
    pub fn reference(&self) -> String {
        self.reference_with_suffix("")
    }

    /// Image reference with a suffix appended to the name (e.g. `-migration-14-16`).
    pub fn reference_with_suffix(&self, suffix: &str) -> String {
        let name = if self.name.contains('/') || self.registry.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.registry.trim_end_matches('/'), self.name)
        };
        format!("{}{}:{}", name, suffix, self.tag)
    }

    /// Same registry, tag and pull policy with another image name.
    ///
    /// Side-service images share the server's registry and tag.
    pub fn sibling(&self, name: &str) -> ImageConfig {
        ImageConfig { name: name.to_string(), ..self.clone() }
    }
}

#[cfg(test)]
#[path = "image_tests.rs"]
mod tests;
