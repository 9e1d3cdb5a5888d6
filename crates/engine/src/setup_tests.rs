// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use keel_adapters::manifest::cert::DB_SECRET;
use keel_adapters::{FakeExec, FakeOrchestrator, OrchestrationCall, ResourceKind};
use keel_core::{AdminConfig, DbConfig};

const NS: &str = "uyuni";

fn config() -> ServerConfig {
    ServerConfig {
        db: DbConfig { password: Some("dbpass".into()), ..Default::default() },
        admin: AdminConfig { password: Some("adminpass".into()), ..Default::default() },
        ..Default::default()
    }
}

fn effective(config: &ServerConfig) -> EffectiveConfig {
    EffectiveConfig::merge(config, None, None, "server.example.com")
}

fn value<'a>(env: &'a [(String, String)], key: &str) -> Option<&'a str> {
    env.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

#[test]
fn env_comes_from_effective_config() {
    let config = config();
    let mut effective = effective(&config);
    effective.timezone = "Europe/Berlin".into();
    effective.db.port = 5433;

    let env = setup_env(&config, &effective, &[]).unwrap();

    assert_eq!(value(&env, "UYUNI_FQDN"), Some("server.example.com"));
    assert_eq!(value(&env, "MANAGER_PASS"), Some("dbpass"));
    assert_eq!(value(&env, "MANAGER_DB_PORT"), Some("5433"));
    assert_eq!(value(&env, "MANAGER_DB_HOST"), Some("localhost"));
    assert_eq!(value(&env, "ADMIN_PASS"), Some("adminpass"));
    assert_eq!(value(&env, "TZ"), Some("Europe/Berlin"));
}

#[test]
fn overrides_replace_and_append() {
    let config = config();
    let env = setup_env(&config, &effective(&config), &[("NO_SSL", "Y"), ("LOCAL_DB", "N")]).unwrap();

    assert_eq!(value(&env, "NO_SSL"), Some("Y"));
    assert_eq!(value(&env, "LOCAL_DB"), Some("N"));
    assert_eq!(env.iter().filter(|(k, _)| k == "LOCAL_DB").count(), 1);
}

#[yare::parameterized(
    db_password = { None, Some("adminpass") },
    admin_password = { Some("dbpass"), None },
)]
fn missing_password_is_a_precondition(db: Option<&str>, admin: Option<&str>) {
    let config = ServerConfig {
        db: DbConfig { password: db.map(str::to_string), ..Default::default() },
        admin: AdminConfig { password: admin.map(str::to_string), ..Default::default() },
        ..Default::default()
    };
    let err = setup_env(&config, &effective(&config), &[]).unwrap_err();
    assert!(matches!(err, ReconcileError::Precondition(_)));
}

#[tokio::test]
async fn successful_setup_stores_credentials() {
    let exec = FakeExec::new();
    let fake = FakeOrchestrator::new();
    let config = config();

    SetupExecutor::new(&exec, &fake, NS)
        .run_with_rollback(&config, &effective(&config), &[("NO_SSL", "Y")])
        .await
        .unwrap();

    let calls = exec.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].script.contains("mgr-setup"));
    assert_eq!(calls[0].env_value("NO_SSL"), Some("Y"));
    assert_eq!(fake.applied(), vec![(ResourceKind::Secret, DB_SECRET.to_string())]);
    assert_eq!(fake.get_secret_data(NS, DB_SECRET, "username").await.unwrap().as_deref(), Some("spacewalk"));
    assert_eq!(fake.get_secret_data(NS, DB_SECRET, "password").await.unwrap().as_deref(), Some("dbpass"));
}

#[tokio::test]
async fn failed_setup_scales_down_before_returning() {
    let exec = FakeExec::new().with_status(1, "setup exploded\n");
    let fake = FakeOrchestrator::new();
    let config = config();

    let err = SetupExecutor::new(&exec, &fake, NS)
        .run_with_rollback(&config, &effective(&config), &[])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReconcileError::SetupFailed { status: 1, ref message } if message == "setup exploded"
    ));
    assert_eq!(
        fake.calls(),
        vec![OrchestrationCall::ScaleTo { namespace: NS.into(), app: SERVER_APP.into(), replicas: 0 }]
    );
    assert!(fake.applied().is_empty());
}

#[tokio::test]
async fn scale_down_error_does_not_hide_setup_error() {
    let exec = FakeExec::new().with_status(2, "boom");
    let fake = FakeOrchestrator::new().fail_scale("forbidden");
    let config = config();

    let err = SetupExecutor::new(&exec, &fake, NS)
        .run_with_rollback(&config, &effective(&config), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::SetupFailed { status: 2, .. }));
}

#[tokio::test]
async fn unreachable_container_is_an_exec_error() {
    let exec = FakeExec::new().fail_connection("no pod");
    let fake = FakeOrchestrator::new();
    let config = config();

    let err = SetupExecutor::new(&exec, &fake, NS)
        .run_with_rollback(&config, &effective(&config), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, ReconcileError::Exec(_)));
    assert!(matches!(fake.calls().as_slice(), [OrchestrationCall::ScaleTo { replicas: 0, .. }]));
}
