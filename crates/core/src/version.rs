// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version gate for database engine transitions.
//!
//! A [`VersionPair`] compares the PostgreSQL major version stored on the
//! existing volume with the one embedded in the target image. Downgrades are
//! terminal: the data format cannot be converted back.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of comparing installed and target versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    NoChange,
    Upgrade,
    UnsupportedDowngrade,
}

impl Transition {
    /// Whether the schema-upgrade job must run and finalize must update the schema.
    pub fn schema_update_required(&self) -> bool {
        matches!(self, Transition::Upgrade)
    }
}

crate::string_enum! {
    Transition, |s| crate::inspect::ParseError::InvalidValue { key: "transition".into(), value: s };
    NoChange => "no-change",
    Upgrade => "upgrade",
    UnsupportedDowngrade => "unsupported-downgrade",
}

/// Installed vs. target engine version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionPair {
    pub installed: u32,
    pub target: u32,
}

/// Terminal error raised for a downgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("downgrading database from PostgreSQL {installed} to {target} is not supported")]
pub struct UnsupportedDowngrade {
    pub installed: u32,
    pub target: u32,
}

impl VersionPair {
    pub fn new(installed: u32, target: u32) -> Self {
        Self { installed, target }
    }

    /// Classify the transition. Pure; never fails.
    pub fn classify(&self) -> Transition {
        match self.installed.cmp(&self.target) {
            Ordering::Equal => Transition::NoChange,
            Ordering::Less => Transition::Upgrade,
            Ordering::Greater => Transition::UnsupportedDowngrade,
        }
    }

    /// Classify, turning a downgrade into its terminal error.
    pub fn check(&self) -> Result<Transition, UnsupportedDowngrade> {
        match self.classify() {
            Transition::UnsupportedDowngrade => {
                Err(UnsupportedDowngrade { installed: self.installed, target: self.target })
            }
            transition => Ok(transition),
        }
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
