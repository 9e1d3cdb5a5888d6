// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch job descriptors and wait policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::image::PullPolicy;
use crate::inspect::ParseError;
use crate::volume::VolumeMount;

/// How long to wait for something before giving up.
///
/// `None` waits until success or a terminal failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    pub max: Option<Duration>,
}

impl WaitPolicy {
    pub fn bounded(max: Duration) -> Self {
        Self { max: Some(max) }
    }

    pub fn bounded_secs(secs: u64) -> Self {
        Self::bounded(Duration::from_secs(secs))
    }

    pub fn unbounded() -> Self {
        Self { max: None }
    }

    pub fn is_bounded(&self) -> bool {
        self.max.is_some()
    }
}

impl std::fmt::Display for WaitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}s", max.as_secs()),
            None => f.write_str("unbounded"),
        }
    }
}

/// The batch jobs the deployer runs, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Migration,
    DbUpgrade,
    DbFinalize,
    PostUpgrade,
}

crate::string_enum! {
    JobKind, |s| ParseError::InvalidValue { key: "job".into(), value: s };
    Migration => "uyuni-migration",
    DbUpgrade => "uyuni-db-upgrade",
    DbFinalize => "uyuni-db-finalize",
    PostUpgrade => "uyuni-post-upgrade",
}

impl JobKind {
    /// Job name in the cluster. Fixed per kind so a rerun replaces the previous job.
    pub fn job_name(&self) -> &'static str {
        self.as_str()
    }

    /// Default wait: the post-upgrade job is short, the others depend on data size.
    pub fn default_wait(&self) -> WaitPolicy {
        match self {
            JobKind::PostUpgrade => WaitPolicy::bounded_secs(60),
            _ => WaitPolicy::unbounded(),
        }
    }
}

/// Everything needed to run one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub kind: JobKind,
    pub image: String,
    pub pull_policy: PullPolicy,
    pub mounts: Vec<VolumeMount>,
    /// Shell script run with `sh -c`
    pub script: String,
    pub wait: WaitPolicy,
}

impl JobDescriptor {
    pub fn new(kind: JobKind, image: impl Into<String>, pull_policy: PullPolicy) -> Self {
        Self {
            kind,
            image: image.into(),
            pull_policy,
            mounts: Vec::new(),
            script: String::new(),
            wait: kind.default_wait(),
        }
    }

    pub fn mounts(mut self, mounts: Vec<VolumeMount>) -> Self {
        self.mounts = mounts;
        self
    }

    pub fn script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    pub fn name(&self) -> &'static str {
        self.kind.job_name()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
