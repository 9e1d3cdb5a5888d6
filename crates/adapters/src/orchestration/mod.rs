// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestration client: every cluster read and write the deployer performs.
//!
//! # Module layout
//!
//! - [`k8s`]: implementation on the Kubernetes API (kube-rs)
//! - `fake`: recording fake for tests (`test-support`)
//!
//! Readiness depends on the kind: a pod is ready once it has `Succeeded`
//! (`Failed` is terminal), a deployment once the controller has rolled out its
//! latest generation with a ready replica, an issuer or certificate once its
//! `Ready` condition is `True`. Any other kind is ready as soon as it exists.

mod k8s;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake;

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use keel_core::WaitPolicy;
use thiserror::Error;

pub use k8s::KubeOrchestrator;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeOrchestrator, OrchestrationCall};

/// Errors from cluster operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestrationError {
    #[error("{op} failed: {message}")]
    Api { op: String, message: String },

    /// The API server refused the request; retrying will not change that.
    #[error("{op} rejected with status {status}: {message}")]
    Rejected { op: String, status: u16, message: String },

    #[error("timed out after {}s waiting for {what}", waited.as_secs())]
    Timeout { what: String, waited: Duration },

    #[error("{what} failed: {reason}")]
    Failed { what: String, reason: String },

    #[error("invalid object: {0}")]
    Invalid(String),
}

impl OrchestrationError {
    pub fn api(op: impl Into<String>, err: impl std::fmt::Display) -> Self {
        OrchestrationError::Api { op: op.into(), message: err.to_string() }
    }

    /// Classify an API server response by HTTP status.
    ///
    /// Client errors are final, except not-found, conflict and throttling,
    /// which a later poll can see resolved.
    pub fn status(op: impl Into<String>, status: u16, err: impl std::fmt::Display) -> Self {
        match status {
            404 | 409 | 429 => Self::api(op, err),
            400..=499 => OrchestrationError::Rejected { op: op.into(), status, message: err.to_string() },
            _ => Self::api(op, err),
        }
    }

    /// Whether polling should stop instead of retrying.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrchestrationError::Failed { .. }
                | OrchestrationError::Invalid(_)
                | OrchestrationError::Rejected { .. }
        )
    }
}

/// Ingress controller found in the cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IngressKind {
    Traefik,
    Nginx,
    #[default]
    Other,
}

keel_core::string_enum! {
    IngressKind, |s| keel_core::ParseError::InvalidValue { key: "ingress".into(), value: s };
    Traefik => "traefik",
    Nginx => "nginx",
    Other => "other",
}

/// Kinds of objects the deployer manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Namespace,
    Pod,
    Job,
    Deployment,
    Service,
    Ingress,
    Secret,
    ConfigMap,
    PersistentVolumeClaim,
    Issuer,
    Certificate,
    IngressRouteTcp,
    IngressRouteUdp,
    Middleware,
}

impl ResourceKind {
    /// `(group, version, kind, plural)` of the API resource.
    pub fn api(&self) -> (&'static str, &'static str, &'static str, &'static str) {
        match self {
            ResourceKind::Namespace => ("", "v1", "Namespace", "namespaces"),
            ResourceKind::Pod => ("", "v1", "Pod", "pods"),
            ResourceKind::Job => ("batch", "v1", "Job", "jobs"),
            ResourceKind::Deployment => ("apps", "v1", "Deployment", "deployments"),
            ResourceKind::Service => ("", "v1", "Service", "services"),
            ResourceKind::Ingress => ("networking.k8s.io", "v1", "Ingress", "ingresses"),
            ResourceKind::Secret => ("", "v1", "Secret", "secrets"),
            ResourceKind::ConfigMap => ("", "v1", "ConfigMap", "configmaps"),
            ResourceKind::PersistentVolumeClaim => {
                ("", "v1", "PersistentVolumeClaim", "persistentvolumeclaims")
            }
            ResourceKind::Issuer => ("cert-manager.io", "v1", "Issuer", "issuers"),
            ResourceKind::Certificate => ("cert-manager.io", "v1", "Certificate", "certificates"),
            ResourceKind::IngressRouteTcp => {
                ("traefik.containo.us", "v1alpha1", "IngressRouteTCP", "ingressroutetcps")
            }
            ResourceKind::IngressRouteUdp => {
                ("traefik.containo.us", "v1alpha1", "IngressRouteUDP", "ingressrouteudps")
            }
            ResourceKind::Middleware => ("traefik.containo.us", "v1alpha1", "Middleware", "middlewares"),
        }
    }

    /// `apiVersion` field value.
    pub fn api_version(&self) -> String {
        match self.api() {
            ("", version, _, _) => version.to_string(),
            (group, version, _, _) => format!("{group}/{version}"),
        }
    }

    pub fn namespaced(&self) -> bool {
        !matches!(self, ResourceKind::Namespace)
    }

    /// Objects whose spec cannot be updated in place and are recreated instead.
    pub fn replaced_on_apply(&self) -> bool {
        matches!(self, ResourceKind::Pod | ResourceKind::Job)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.api().2)
    }
}

/// An object to apply. Typed for built-in kinds, JSON for custom resources.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Pod(Pod),
    Job(Job),
    Deployment(Deployment),
    Service(Service),
    Ingress(Ingress),
    Secret(Secret),
    ConfigMap(ConfigMap),
    Claim(PersistentVolumeClaim),
    Custom { kind: ResourceKind, object: serde_json::Value },
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Pod(_) => ResourceKind::Pod,
            Resource::Job(_) => ResourceKind::Job,
            Resource::Deployment(_) => ResourceKind::Deployment,
            Resource::Service(_) => ResourceKind::Service,
            Resource::Ingress(_) => ResourceKind::Ingress,
            Resource::Secret(_) => ResourceKind::Secret,
            Resource::ConfigMap(_) => ResourceKind::ConfigMap,
            Resource::Claim(_) => ResourceKind::PersistentVolumeClaim,
            Resource::Custom { kind, .. } => *kind,
        }
    }

    pub fn name(&self) -> &str {
        let name = match self {
            Resource::Pod(o) => o.metadata.name.as_deref(),
            Resource::Job(o) => o.metadata.name.as_deref(),
            Resource::Deployment(o) => o.metadata.name.as_deref(),
            Resource::Service(o) => o.metadata.name.as_deref(),
            Resource::Ingress(o) => o.metadata.name.as_deref(),
            Resource::Secret(o) => o.metadata.name.as_deref(),
            Resource::ConfigMap(o) => o.metadata.name.as_deref(),
            Resource::Claim(o) => o.metadata.name.as_deref(),
            Resource::Custom { object, .. } => object.pointer("/metadata/name").and_then(|v| v.as_str()),
        };
        name.unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        let namespace = match self {
            Resource::Pod(o) => o.metadata.namespace.as_deref(),
            Resource::Job(o) => o.metadata.namespace.as_deref(),
            Resource::Deployment(o) => o.metadata.namespace.as_deref(),
            Resource::Service(o) => o.metadata.namespace.as_deref(),
            Resource::Ingress(o) => o.metadata.namespace.as_deref(),
            Resource::Secret(o) => o.metadata.namespace.as_deref(),
            Resource::ConfigMap(o) => o.metadata.namespace.as_deref(),
            Resource::Claim(o) => o.metadata.namespace.as_deref(),
            Resource::Custom { object, .. } => {
                object.pointer("/metadata/namespace").and_then(|v| v.as_str())
            }
        };
        namespace.unwrap_or_default()
    }

    /// Serialized object, including `apiVersion` and `kind`.
    pub fn to_value(&self) -> Result<serde_json::Value, OrchestrationError> {
        let value = match self {
            Resource::Pod(o) => serde_json::to_value(o),
            Resource::Job(o) => serde_json::to_value(o),
            Resource::Deployment(o) => serde_json::to_value(o),
            Resource::Service(o) => serde_json::to_value(o),
            Resource::Ingress(o) => serde_json::to_value(o),
            Resource::Secret(o) => serde_json::to_value(o),
            Resource::ConfigMap(o) => serde_json::to_value(o),
            Resource::Claim(o) => serde_json::to_value(o),
            Resource::Custom { object, .. } => Ok(object.clone()),
        };
        value.map_err(|e| OrchestrationError::Invalid(format!("{} {}: {}", self.kind(), self.name(), e)))
    }
}

/// Adapter for the cluster API
#[async_trait]
pub trait OrchestrationClient: Clone + Send + Sync + 'static {
    /// Create the namespace if it does not exist.
    async fn ensure_namespace(&self, namespace: &str) -> Result<(), OrchestrationError>;

    /// Create or update objects, in order. Pods and jobs are replaced.
    async fn apply(&self, resources: &[Resource]) -> Result<(), OrchestrationError>;

    /// Block until the object is ready (see module docs).
    async fn wait_for_ready(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        policy: WaitPolicy,
    ) -> Result<(), OrchestrationError>;

    /// Block until the job succeeds. A failed job is terminal.
    async fn wait_for_job(
        &self,
        namespace: &str,
        name: &str,
        policy: WaitPolicy,
    ) -> Result<(), OrchestrationError>;

    async fn exists(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<bool, OrchestrationError>;

    /// Whether the claim exists and is `Bound`.
    async fn volume_bound(&self, namespace: &str, name: &str) -> Result<bool, OrchestrationError>;

    /// Image of the deployment's first container, if the deployment exists.
    async fn running_image(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<Option<String>, OrchestrationError>;

    async fn get_logs(&self, namespace: &str, pod: &str) -> Result<String, OrchestrationError>;

    /// One decoded value of a secret, if both exist.
    async fn get_secret_data(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<Option<String>, OrchestrationError>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), OrchestrationError>;

    /// Set the replicas of every deployment labelled `app=<app>`.
    async fn scale_to(&self, namespace: &str, app: &str, replicas: i32) -> Result<(), OrchestrationError>;

    async fn detect_ingress(&self) -> Result<IngressKind, OrchestrationError>;
}

/// Whether a deployment has rolled out its current spec with a ready replica.
///
/// The controller must have observed the latest generation and updated at
/// least the desired number of replicas, so a server still running the
/// previous image does not count as ready.
pub(crate) fn deployment_rolled_out(deployment: &Deployment) -> bool {
    let Some(status) = &deployment.status else {
        return false;
    };
    let generation = deployment.metadata.generation.unwrap_or(0);
    let desired = deployment.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1).max(1);
    status.observed_generation.unwrap_or(0) >= generation
        && status.updated_replicas.unwrap_or(0) >= desired
        && status.ready_replicas.unwrap_or(0) > 0
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
