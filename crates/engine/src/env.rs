// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use std::time::Duration;

use keel_core::WaitPolicy;

/// How long the inspection and extraction pods may take to complete, unless
/// `KEEL_INSPECT_WAIT_MS` says otherwise.
pub const INSPECT_WAIT_SECS: u64 = 60;

/// Wait settings of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Delay between two polls of the cluster
    pub poll_interval: Duration,
    /// Until the server deployment and side services have a ready pod
    pub ready_wait: WaitPolicy,
    /// Best-effort wait for the `uyuni-cert` secret
    pub cert_secret_wait: WaitPolicy,
    /// Until a cert-manager issuer reports ready
    pub issuer_wait: WaitPolicy,
    /// Until an inspection pod completes
    pub inspect_wait: WaitPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            ready_wait: WaitPolicy::bounded_secs(600),
            cert_secret_wait: WaitPolicy::bounded_secs(60),
            issuer_wait: WaitPolicy::bounded_secs(120),
            inspect_wait: WaitPolicy::bounded_secs(INSPECT_WAIT_SECS),
        }
    }
}

impl Settings {
    /// Defaults overridden by `KEEL_*_MS` variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: poll_interval(),
            ready_wait: bounded("KEEL_READY_TIMEOUT_MS", defaults.ready_wait),
            cert_secret_wait: bounded("KEEL_CERT_WAIT_MS", defaults.cert_secret_wait),
            issuer_wait: bounded("KEEL_ISSUER_WAIT_MS", defaults.issuer_wait),
            inspect_wait: bounded("KEEL_INSPECT_WAIT_MS", defaults.inspect_wait),
        }
    }
}

/// Poll interval (default 2s, configurable via `KEEL_POLL_INTERVAL_MS`).
pub fn poll_interval() -> Duration {
    millis(std::env::var("KEEL_POLL_INTERVAL_MS").ok()).unwrap_or(Duration::from_secs(2))
}

fn bounded(var: &str, default: WaitPolicy) -> WaitPolicy {
    millis(std::env::var(var).ok()).map(WaitPolicy::bounded).unwrap_or(default)
}

fn millis(value: Option<String>) -> Option<Duration> {
    value.and_then(|s| s.trim().parse::<u64>().ok()).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
