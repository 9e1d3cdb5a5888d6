// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use k8s_openapi::api::apps::v1::{DeploymentSpec, DeploymentStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde_json::json;

use super::*;

#[yare::parameterized(
    core_kind = { ResourceKind::Pod, "v1" },
    batch = { ResourceKind::Job, "batch/v1" },
    apps = { ResourceKind::Deployment, "apps/v1" },
    networking = { ResourceKind::Ingress, "networking.k8s.io/v1" },
    cert_manager = { ResourceKind::Issuer, "cert-manager.io/v1" },
    traefik = { ResourceKind::IngressRouteTcp, "traefik.containo.us/v1alpha1" },
)]
fn api_version_joins_group_and_version(kind: ResourceKind, expected: &str) {
    assert_eq!(kind.api_version(), expected);
}

#[test]
fn only_pods_and_jobs_are_replaced() {
    assert!(ResourceKind::Pod.replaced_on_apply());
    assert!(ResourceKind::Job.replaced_on_apply());
    assert!(!ResourceKind::Deployment.replaced_on_apply());
    assert!(!ResourceKind::Secret.replaced_on_apply());
}

#[test]
fn namespace_is_cluster_scoped() {
    assert!(!ResourceKind::Namespace.namespaced());
    assert!(ResourceKind::Certificate.namespaced());
}

#[test]
fn kind_displays_as_api_kind() {
    assert_eq!(ResourceKind::IngressRouteUdp.to_string(), "IngressRouteUDP");
    assert_eq!(ResourceKind::PersistentVolumeClaim.to_string(), "PersistentVolumeClaim");
}

#[test]
fn typed_resource_reports_metadata() {
    let secret = Resource::Secret(Secret {
        metadata: ObjectMeta {
            name: Some("uyuni-cert".into()),
            namespace: Some("uyuni".into()),
            ..Default::default()
        },
        ..Default::default()
    });
    assert_eq!(secret.kind(), ResourceKind::Secret);
    assert_eq!(secret.name(), "uyuni-cert");
    assert_eq!(secret.namespace(), "uyuni");
}

#[test]
fn custom_resource_reads_metadata_from_json() {
    let issuer = Resource::Custom {
        kind: ResourceKind::Issuer,
        object: json!({
            "apiVersion": "cert-manager.io/v1",
            "kind": "Issuer",
            "metadata": { "name": "uyuni-ca-issuer", "namespace": "uyuni" },
        }),
    };
    assert_eq!(issuer.kind(), ResourceKind::Issuer);
    assert_eq!(issuer.name(), "uyuni-ca-issuer");
    assert_eq!(issuer.namespace(), "uyuni");
    assert_eq!(issuer.to_value().unwrap()["kind"], "Issuer");
}

#[test]
fn missing_metadata_reads_as_empty() {
    let object = Resource::Custom { kind: ResourceKind::Middleware, object: json!({}) };
    assert_eq!(object.name(), "");
    assert_eq!(object.namespace(), "");
}

#[test]
fn typed_resource_serializes_with_type_meta() {
    let map = Resource::ConfigMap(ConfigMap {
        metadata: ObjectMeta { name: Some("uyuni-ca".into()), ..Default::default() },
        ..Default::default()
    });
    let value = map.to_value().unwrap();
    assert_eq!(value["apiVersion"], "v1");
    assert_eq!(value["kind"], "ConfigMap");
    assert_eq!(value["metadata"]["name"], "uyuni-ca");
}

#[yare::parameterized(
    api = { OrchestrationError::api("get pod", "boom"), false },
    timeout = { OrchestrationError::Timeout { what: "x".into(), waited: Duration::from_secs(1) }, false },
    failed = { OrchestrationError::Failed { what: "job".into(), reason: "BackoffLimitExceeded".into() }, true },
    invalid = { OrchestrationError::Invalid("bad".into()), true },
    rejected = { OrchestrationError::status("get pod", 403, "forbidden"), true },
)]
fn terminal_errors(err: OrchestrationError, terminal: bool) {
    assert_eq!(err.is_terminal(), terminal);
}

#[yare::parameterized(
    unauthorized = { 401, true },
    forbidden = { 403, true },
    unprocessable = { 422, true },
    not_found = { 404, false },
    conflict = { 409, false },
    throttled = { 429, false },
    server_error = { 500, false },
    unavailable = { 503, false },
)]
fn status_classifies_client_errors_as_terminal(code: u16, terminal: bool) {
    let err = OrchestrationError::status("get job uyuni/db-upgrade", code, "denied");
    assert_eq!(err.is_terminal(), terminal);
}

#[test]
fn rejected_message_names_status() {
    let err = OrchestrationError::status("get secret uyuni/uyuni-cert", 403, "secrets is forbidden");
    assert_eq!(err.to_string(), "get secret uyuni/uyuni-cert rejected with status 403: secrets is forbidden");
}

fn deployment(generation: i64, observed: i64, updated: i32, ready: i32) -> Deployment {
    Deployment {
        metadata: ObjectMeta { name: Some("uyuni".into()), generation: Some(generation), ..Default::default() },
        spec: Some(DeploymentSpec { replicas: Some(1), ..Default::default() }),
        status: Some(DeploymentStatus {
            observed_generation: Some(observed),
            updated_replicas: Some(updated),
            ready_replicas: Some(ready),
            ..Default::default()
        }),
    }
}

#[yare::parameterized(
    rolled_out = { deployment(2, 2, 1, 1), true },
    spec_not_observed = { deployment(3, 2, 1, 1), false },
    old_replica_still_ready = { deployment(2, 2, 0, 1), false },
    updated_not_ready = { deployment(2, 2, 1, 0), false },
)]
fn deployment_readiness_follows_the_rollout(deployment: Deployment, ready: bool) {
    assert_eq!(deployment_rolled_out(&deployment), ready);
}

#[test]
fn deployment_without_status_is_not_ready() {
    let mut fresh = deployment(1, 1, 1, 1);
    fresh.status = None;
    assert!(!deployment_rolled_out(&fresh));
}

#[test]
fn timeout_message_names_duration() {
    let err = OrchestrationError::Timeout { what: "pod uyuni/x".into(), waited: Duration::from_secs(60) };
    assert_eq!(err.to_string(), "timed out after 60s waiting for pod uyuni/x");
}

#[test]
fn ingress_kind_parses_case_insensitively() {
    assert_eq!("Traefik".parse::<IngressKind>().unwrap(), IngressKind::Traefik);
    assert!("haproxy".parse::<IngressKind>().is_err());
}

#[tokio::test]
async fn fake_binds_applied_claims_and_issues_certificates() {
    let fake = FakeOrchestrator::new();
    let claim = Resource::Claim(PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some("var-pgsql".into()),
            namespace: Some("uyuni".into()),
            ..Default::default()
        },
        ..Default::default()
    });
    let certificate = Resource::Custom {
        kind: ResourceKind::Certificate,
        object: json!({
            "metadata": { "name": "uyuni-ca", "namespace": "uyuni" },
            "spec": { "secretName": "uyuni-ca" },
        }),
    };
    fake.apply(&[claim, certificate]).await.unwrap();

    assert!(fake.volume_bound("uyuni", "var-pgsql").await.unwrap());
    assert!(fake.get_secret_data("uyuni", "uyuni-ca", "ca.crt").await.unwrap().is_some());
    assert_eq!(
        fake.applied(),
        vec![
            (ResourceKind::PersistentVolumeClaim, "var-pgsql".to_string()),
            (ResourceKind::Certificate, "uyuni-ca".to_string()),
        ]
    );
}

#[tokio::test]
async fn fake_injects_job_failure() {
    let fake = FakeOrchestrator::new().fail_job("uyuni-db-upgrade", "BackoffLimitExceeded");
    let err = fake.wait_for_job("uyuni", "uyuni-db-upgrade", WaitPolicy::unbounded()).await.unwrap_err();
    assert!(err.is_terminal());
    assert!(fake.wait_for_job("uyuni", "uyuni-db-finalize", WaitPolicy::unbounded()).await.is_ok());
}
