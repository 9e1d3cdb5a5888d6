// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rejected upgrade specs
//!
//! Verify a refused upgrade leaves the running server untouched.

use crate::prelude::*;

fn untouched(cluster: &Cluster) {
    let mutated = cluster.orchestrator.calls().into_iter().any(|c| match c {
        OrchestrationCall::Apply { kind, .. } => {
            matches!(kind, ResourceKind::PersistentVolumeClaim | ResourceKind::Job | ResourceKind::Deployment)
        }
        OrchestrationCall::ScaleTo { .. } => true,
        _ => false,
    });
    assert!(!mutated, "unexpected mutation: {:?}", cluster.orchestrator.calls());
}

#[tokio::test]
async fn older_release_is_refused() {
    let cluster = Cluster::new(
        FakeOrchestrator::new()
            .with_pod_output(&image("2025.10"), &release("2025.10", 16, 16))
            .with_pod_output(&image("2025.07"), &release("2025.07", 16, 16)),
    );
    cluster.install("2025.10").await;
    cluster.next_run();

    let err = cluster.upgrade("2025.07").await.unwrap_err();

    assert!(matches!(err, ReconcileError::Sanity(_)), "{err}");
    assert_eq!(err.exit_code(), 3);
    untouched(&cluster);
    assert_eq!(cluster.server_image(), Some(image("2025.10")));
}

#[tokio::test]
async fn postgres_downgrade_is_refused() {
    let cluster = Cluster::new(
        FakeOrchestrator::new()
            .with_pod_output(&image("2025.10"), &release("2025.10", 17, 17))
            .with_pod_output(&image("2025.10.1"), &release("2025.10.1", 17, 16)),
    );
    cluster.install("2025.10").await;
    cluster.next_run();

    let err = cluster.upgrade("2025.10.1").await.unwrap_err();

    assert!(matches!(err, ReconcileError::UnsupportedDowngrade(_)), "{err}");
    let message = err.to_string();
    assert!(message.contains("17") && message.contains("16"), "{message}");
    untouched(&cluster);
    assert_eq!(cluster.server_image(), Some(image("2025.10")));
}

#[tokio::test]
async fn upgrade_of_an_empty_namespace_is_refused() {
    let cluster = Cluster::new(FakeOrchestrator::new());

    let err = cluster.upgrade("2025.10").await.unwrap_err();

    assert_eq!(err.exit_code(), 2);
    untouched(&cluster);
}
