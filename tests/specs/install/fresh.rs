// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Install specs
//!
//! Verify a fresh namespace ends with a set-up server.

use crate::prelude::*;

#[tokio::test]
async fn fresh_install_deploys_and_sets_up_the_server() {
    let cluster = Cluster::new(FakeOrchestrator::new());

    let outcome = cluster.install("2025.10").await;

    assert!(outcome.setup_ran);
    assert_eq!(outcome.transition, None);
    assert!(outcome.jobs.is_empty());
    assert_eq!(cluster.server_image(), Some(image("2025.10")));
    assert_eq!(cluster.exec.calls().len(), 1);
}

#[tokio::test]
async fn fresh_install_claims_every_server_volume() {
    let cluster = Cluster::new(FakeOrchestrator::new());

    cluster.install("2025.10").await;

    let claims = cluster.orchestrator.applied_names(ResourceKind::PersistentVolumeClaim);
    assert!(claims.contains(&DATABASE_VOLUME.to_string()));
    let mut unique = claims.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), claims.len(), "a claim was applied twice: {claims:?}");
}

#[tokio::test]
async fn failed_setup_leaves_the_server_stopped_and_can_be_retried() {
    let orchestrator = FakeOrchestrator::new().with_pod_output(&image("2025.10"), &release("2025.10", 16, 16));
    let broken = Cluster::new(orchestrator.clone()).with_exec(FakeExec::new().with_status(2, "database unreachable"));

    let err = broken.run(Lifecycle::Install, FQDN, config("2025.10")).await.unwrap_err();

    assert_eq!(err.exit_code(), 6);
    assert!(err.to_string().contains("database unreachable"), "{err}");
    assert!(broken
        .orchestrator
        .position(|c| matches!(c, OrchestrationCall::ScaleTo { replicas: 0, .. }))
        .is_some());

    // The claims stay bound but the credentials were never stored
    let retry = Cluster::new(orchestrator);
    retry.next_run();

    let outcome = retry.install("2025.10").await;

    assert!(outcome.setup_ran);
    assert_eq!(outcome.transition, Some(Transition::NoChange));
    assert_eq!(retry.exec.calls().len(), 1);
}
