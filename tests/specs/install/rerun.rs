// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rerun specs
//!
//! Verify installing again over a running server changes nothing that matters.

use crate::prelude::*;

#[tokio::test]
async fn second_install_skips_setup_and_database_upgrade() {
    let cluster = Cluster::new(FakeOrchestrator::new().with_pod_output(&image("2025.10"), &release("2025.10", 16, 16)));
    cluster.install("2025.10").await;
    cluster.next_run();

    let outcome = cluster.install("2025.10").await;

    similar_asserts::assert_eq!(
        outcome,
        Outcome {
            lifecycle: Lifecycle::Install,
            fqdn: FQDN.to_string(),
            transition: Some(Transition::NoChange),
            issuer: outcome.issuer.clone(),
            setup_ran: false,
            jobs: vec![JobKind::DbFinalize, JobKind::PostUpgrade],
        }
    );
    assert_eq!(cluster.exec.calls().len(), 1);
    assert!(cluster.orchestrator.applied_names(ResourceKind::PersistentVolumeClaim).is_empty());
    assert!(cluster
        .orchestrator
        .position(|c| matches!(c, OrchestrationCall::ScaleTo { .. }))
        .is_none());
}
