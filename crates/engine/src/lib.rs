// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! keel-engine: reconciles a namespace towards a running server.

pub mod certs;
pub mod env;
pub mod error;
pub mod jobs;
pub mod probe;
pub mod reconcile;
pub mod rollout;
pub mod scripts;
pub mod setup;

pub use certs::CertProvisioner;
pub use env::Settings;
pub use error::ReconcileError;
pub use jobs::JobSequencer;
pub use probe::{ProbeResult, Prober};
pub use reconcile::{Outcome, ReconcileDeps, Reconciler, Request};
pub use rollout::{Rollout, ServerRollout};
pub use setup::SetupExecutor;
