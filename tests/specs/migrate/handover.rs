// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migration specs
//!
//! Verify a server copied from a source host runs on the cluster under the
//! source's identity and can be upgraded afterwards.

use keel_adapters::manifest::EXTRACTOR_POD;
use keel_core::MigrationSource;

use crate::prelude::*;

const SOURCE: &str = "old.example.com";
const CERT: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

fn migrated_cluster() -> Cluster {
    let source = InspectedConfig::builder()
        .fqdn(Some(SOURCE.into()))
        .db_password(Some("migrated".into()))
        .timezone(Some("Europe/Paris".into()))
        .build();
    let extracted = extractor_output(
        &source,
        &[("RHN-ORG-PRIVATE-SSL-KEY", "CAKEY"), ("RHN-ORG-TRUSTED-SSL-CERT", CERT)],
    );
    Cluster::new(
        FakeOrchestrator::new()
            .with_pod_logs(EXTRACTOR_POD, &extracted)
            .with_pod_output(&image("2025.07"), &release("2025.07", 16, 16))
            .with_pod_output(&image("2025.10"), &release("2025.10", 16, 17)),
    )
}

fn migrate_config() -> ServerConfig {
    let mut config = ServerConfig {
        namespace: NS.to_string(),
        migration: MigrationSource { ssh_key: Some("PRIVATE".into()), ..Default::default() },
        ..Default::default()
    };
    config.image.tag = "2025.07".to_string();
    config
}

#[tokio::test]
async fn migrated_server_keeps_the_source_identity() {
    let cluster = migrated_cluster();

    let outcome = cluster.run(Lifecycle::Migrate, SOURCE, migrate_config()).await.unwrap();

    assert_eq!(outcome.fqdn, SOURCE);
    assert_eq!(outcome.jobs, vec![JobKind::Migration, JobKind::DbFinalize, JobKind::PostUpgrade]);
    assert!(!outcome.setup_ran);
    assert!(cluster.exec.calls().is_empty());
    assert_eq!(cluster.server_image(), Some(image("2025.07")));
}

#[tokio::test]
async fn migrated_server_upgrades_like_an_installed_one() {
    let cluster = migrated_cluster();
    cluster.run(Lifecycle::Migrate, SOURCE, migrate_config()).await.unwrap();
    cluster.next_run();

    let mut config = ServerConfig { namespace: NS.to_string(), ..Default::default() };
    config.image.tag = "2025.10".to_string();
    let outcome = cluster.run(Lifecycle::Upgrade, SOURCE, config).await.unwrap();

    assert_eq!(outcome.transition, Some(Transition::Upgrade));
    assert_eq!(cluster.jobs(), vec!["uyuni-db-upgrade", "uyuni-db-finalize", "uyuni-post-upgrade"]);
    assert!(!outcome.setup_ran);
    assert!(cluster.exec.calls().is_empty());
    assert_eq!(cluster.server_image(), Some(image("2025.10")));
}

#[tokio::test]
async fn failed_transfer_deploys_nothing() {
    let cluster = Cluster::new(FakeOrchestrator::new().fail_job("uyuni-migration", "ssh: connection refused"));

    let err = cluster.run(Lifecycle::Migrate, SOURCE, migrate_config()).await.unwrap_err();

    assert_eq!(err.exit_code(), 5);
    assert!(err.to_string().contains("connection refused"), "{err}");
    assert_eq!(cluster.jobs(), vec!["uyuni-migration"]);
    assert_eq!(cluster.server_image(), None);
}
