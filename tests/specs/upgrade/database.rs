// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upgrade specs
//!
//! Verify an installed server moves to a newer image, upgrading its
//! database only when the image ships a newer PostgreSQL.

use crate::prelude::*;

/// Installed on 2025.07 with PostgreSQL 16; 2025.10 ships PostgreSQL 17.
fn installed_cluster() -> Cluster {
    Cluster::new(
        FakeOrchestrator::new()
            .with_pod_output(&image("2025.07"), &release("2025.07", 16, 16))
            .with_pod_output(&image("2025.10"), &release("2025.10", 16, 17)),
    )
}

#[tokio::test]
async fn install_then_upgrade_to_newer_postgres() {
    let cluster = installed_cluster();
    cluster.install("2025.07").await;
    cluster.next_run();

    let outcome = cluster.upgrade("2025.10").await.unwrap();

    assert_eq!(outcome.transition, Some(Transition::Upgrade));
    assert_eq!(outcome.jobs, vec![JobKind::DbUpgrade, JobKind::DbFinalize, JobKind::PostUpgrade]);
    assert_eq!(cluster.jobs(), vec!["uyuni-db-upgrade", "uyuni-db-finalize", "uyuni-post-upgrade"]);
    assert_eq!(cluster.server_image(), Some(image("2025.10")));
    assert!(!outcome.setup_ran);
    assert_eq!(cluster.exec.calls().len(), 1);
}

#[tokio::test]
async fn server_is_stopped_before_the_database_upgrade_and_restarted_after() {
    let cluster = installed_cluster();
    cluster.install("2025.07").await;
    cluster.next_run();

    cluster.upgrade("2025.10").await.unwrap();

    let orchestrator = &cluster.orchestrator;
    let stopped = orchestrator
        .position(|c| matches!(c, OrchestrationCall::ScaleTo { replicas: 0, .. }))
        .unwrap();
    let upgrade = orchestrator.apply_position(ResourceKind::Job, "uyuni-db-upgrade").unwrap();
    let restarted = orchestrator.apply_position(ResourceKind::Deployment, SERVER_DEPLOY_NAME).unwrap();
    assert!(stopped < upgrade);
    assert!(upgrade < restarted);
}

#[tokio::test]
async fn upgrade_to_same_postgres_only_finalizes() {
    let cluster = Cluster::new(
        FakeOrchestrator::new()
            .with_pod_output(&image("2025.07"), &release("2025.07", 16, 16))
            .with_pod_output(&image("2025.10"), &release("2025.10", 16, 16)),
    );
    cluster.install("2025.07").await;
    cluster.next_run();

    let outcome = cluster.upgrade("2025.10").await.unwrap();

    assert_eq!(outcome.transition, Some(Transition::NoChange));
    assert_eq!(cluster.jobs(), vec!["uyuni-db-finalize", "uyuni-post-upgrade"]);
    assert_eq!(cluster.server_image(), Some(image("2025.10")));
    assert!(cluster
        .orchestrator
        .position(|c| matches!(c, OrchestrationCall::ScaleTo { .. }))
        .is_none());
}
