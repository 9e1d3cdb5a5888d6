// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestration client on the Kubernetes API.

use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Secret};
use keel_core::WaitPolicy;
use kube::api::{Api, DeleteParams, DynamicObject, GroupVersionKind, ListParams, LogParams, Patch, PatchParams};
use kube::discovery::ApiResource;
use kube::Client;

use super::{deployment_rolled_out, IngressKind, OrchestrationClient, OrchestrationError, Resource, ResourceKind};
use crate::wait::poll_until;

/// Field manager recorded on server-side applied objects.
const FIELD_MANAGER: &str = "keel";

/// How long a replaced pod or job may take to disappear.
const DELETION_WAIT: Duration = Duration::from_secs(300);

/// Map a kube-rs error, keeping the HTTP status of API responses.
fn kube_error(op: impl Into<String>, err: kube::Error) -> OrchestrationError {
    match err {
        kube::Error::Api(response) => OrchestrationError::status(op, response.code, response.message),
        other => OrchestrationError::api(op, other),
    }
}

/// Orchestration client backed by kube-rs.
#[derive(Clone)]
pub struct KubeOrchestrator {
    client: Client,
    poll_interval: Duration,
}

impl KubeOrchestrator {
    /// Connect with the default kubeconfig or in-cluster configuration.
    pub async fn connect(poll_interval: Duration) -> Result<Self, OrchestrationError> {
        let client = Client::try_default()
            .await
            .map_err(|e| kube_error("create kube client", e))?;
        Ok(Self::new(client, poll_interval))
    }

    pub fn new(client: Client, poll_interval: Duration) -> Self {
        Self { client, poll_interval }
    }

    fn dynamic(&self, kind: ResourceKind, namespace: &str) -> Api<DynamicObject> {
        let (group, version, kind_name, plural) = kind.api();
        let gvk = GroupVersionKind::gvk(group, version, kind_name);
        let resource = ApiResource::from_gvk_with_plural(&gvk, plural);
        if kind.namespaced() {
            Api::namespaced_with(self.client.clone(), namespace, &resource)
        } else {
            Api::all_with(self.client.clone(), &resource)
        }
    }

    async fn get_dynamic(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>, OrchestrationError> {
        self.dynamic(kind, namespace)
            .get_opt(name)
            .await
            .map_err(|e| kube_error(format!("get {kind} {namespace}/{name}"), e))
    }

    async fn server_side_apply(&self, resource: &Resource) -> Result<(), OrchestrationError> {
        let kind = resource.kind();
        let name = resource.name();
        let value = resource.to_value()?;
        let params = PatchParams::apply(FIELD_MANAGER).force();
        self.dynamic(kind, resource.namespace())
            .patch(name, &params, &Patch::Apply(&value))
            .await
            .map_err(|e| kube_error(format!("apply {kind} {name}"), e))?;
        tracing::debug!(%kind, name, "applied");
        Ok(())
    }

    /// Delete, wait until gone, then create.
    async fn replace(&self, resource: &Resource) -> Result<(), OrchestrationError> {
        let kind = resource.kind();
        let namespace = resource.namespace();
        let name = resource.name();
        if self.get_dynamic(kind, namespace, name).await?.is_some() {
            tracing::info!(%kind, name, "replacing existing object");
            self.delete(kind, namespace, name).await?;
            let what = format!("deletion of {kind} {namespace}/{name}");
            poll_until(&what, WaitPolicy::bounded(DELETION_WAIT), self.poll_interval, || async move {
                Ok(self.get_dynamic(kind, namespace, name).await?.is_none().then_some(()))
            })
            .await?;
        }
        self.server_side_apply(resource).await
    }

    async fn pod_succeeded(&self, namespace: &str, name: &str) -> Result<Option<()>, OrchestrationError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod = pods
            .get_opt(name)
            .await
            .map_err(|e| kube_error(format!("get pod {namespace}/{name}"), e))?;
        let status = pod.and_then(|p| p.status);
        let phase = status.as_ref().and_then(|s| s.phase.clone());
        match phase.as_deref() {
            Some("Succeeded") => Ok(Some(())),
            Some("Failed") => Err(OrchestrationError::Failed {
                what: format!("pod {namespace}/{name}"),
                reason: status
                    .and_then(|s| s.message.or(s.reason))
                    .unwrap_or_else(|| "pod failed".to_string()),
            }),
            _ => Ok(None),
        }
    }

    async fn deployment_ready(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<()>, OrchestrationError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let deployment = deployments
            .get_opt(name)
            .await
            .map_err(|e| kube_error(format!("get deployment {namespace}/{name}"), e))?;
        Ok(deployment.as_ref().is_some_and(deployment_rolled_out).then_some(()))
    }

    async fn condition_ready(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<()>, OrchestrationError> {
        let Some(object) = self.get_dynamic(kind, namespace, name).await? else {
            return Ok(None);
        };
        let ready = object
            .data
            .pointer("/status/conditions")
            .and_then(|c| c.as_array())
            .is_some_and(|conditions| {
                conditions.iter().any(|c| {
                    c.get("type").and_then(|t| t.as_str()) == Some("Ready")
                        && c.get("status").and_then(|s| s.as_str()) == Some("True")
                })
            });
        Ok(ready.then_some(()))
    }
}

#[async_trait]
impl OrchestrationClient for KubeOrchestrator {
    async fn ensure_namespace(&self, namespace: &str) -> Result<(), OrchestrationError> {
        let object = serde_json::json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": { "name": namespace }
        });
        self.server_side_apply(&Resource::Custom { kind: ResourceKind::Namespace, object }).await
    }

    async fn apply(&self, resources: &[Resource]) -> Result<(), OrchestrationError> {
        for resource in resources {
            if resource.kind().replaced_on_apply() {
                self.replace(resource).await?;
            } else {
                self.server_side_apply(resource).await?;
            }
        }
        Ok(())
    }

    async fn wait_for_ready(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
        policy: WaitPolicy,
    ) -> Result<(), OrchestrationError> {
        let what = format!("{kind} {namespace}/{name}");
        tracing::debug!(%what, %policy, "waiting for readiness");
        poll_until(&what, policy, self.poll_interval, || async move {
            match kind {
                ResourceKind::Pod => self.pod_succeeded(namespace, name).await,
                ResourceKind::Deployment => self.deployment_ready(namespace, name).await,
                ResourceKind::Issuer | ResourceKind::Certificate => {
                    self.condition_ready(kind, namespace, name).await
                }
                _ => Ok(self.exists(kind, namespace, name).await?.then_some(())),
            }
        })
        .await
    }

    async fn wait_for_job(
        &self,
        namespace: &str,
        name: &str,
        policy: WaitPolicy,
    ) -> Result<(), OrchestrationError> {
        let jobs: Api<Job> = Api::namespaced(self.client.clone(), namespace);
        let jobs = &jobs;
        let what = format!("job {namespace}/{name}");
        let job_ref = what.as_str();
        poll_until(&what, policy, self.poll_interval, || async move {
            let job = jobs
                .get_opt(name)
                .await
                .map_err(|e| kube_error(format!("get job {namespace}/{name}"), e))?;
            // Only called after the job was applied, so absence means it was removed
            let Some(job) = job else {
                return Err(OrchestrationError::Failed {
                    what: job_ref.to_string(),
                    reason: "job disappeared".to_string(),
                });
            };
            let Some(status) = job.status else {
                return Ok(None);
            };
            if status.succeeded.unwrap_or(0) > 0 {
                return Ok(Some(()));
            }
            let failed_condition = status.conditions.as_ref().and_then(|conditions| {
                conditions.iter().find(|c| c.type_ == "Failed" && c.status == "True")
            });
            if status.failed.unwrap_or(0) > 0 || failed_condition.is_some() {
                let reason = failed_condition
                    .and_then(|c| c.message.clone().or_else(|| c.reason.clone()))
                    .unwrap_or_else(|| "job failed".to_string());
                return Err(OrchestrationError::Failed { what: job_ref.to_string(), reason });
            }
            Ok(None)
        })
        .await
    }

    async fn exists(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<bool, OrchestrationError> {
        Ok(self.get_dynamic(kind, namespace, name).await?.is_some())
    }

    async fn volume_bound(&self, namespace: &str, name: &str) -> Result<bool, OrchestrationError> {
        let claims: Api<PersistentVolumeClaim> = Api::namespaced(self.client.clone(), namespace);
        let claim = claims
            .get_opt(name)
            .await
            .map_err(|e| kube_error(format!("get claim {namespace}/{name}"), e))?;
        let phase = claim.and_then(|c| c.status).and_then(|s| s.phase);
        Ok(phase.as_deref() == Some("Bound"))
    }

    async fn running_image(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<Option<String>, OrchestrationError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let found = deployments.get_opt(deployment).await.map_err(|e| {
            kube_error(format!("get deployment {namespace}/{deployment}"), e)
        })?;
        Ok(found
            .and_then(|d| d.spec)
            .and_then(|s| s.template.spec)
            .and_then(|s| s.containers.into_iter().next())
            .and_then(|c| c.image))
    }

    async fn get_logs(&self, namespace: &str, pod: &str) -> Result<String, OrchestrationError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        pods.logs(pod, &LogParams::default())
            .await
            .map_err(|e| kube_error(format!("get logs of pod {namespace}/{pod}"), e))
    }

    async fn get_secret_data(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
    ) -> Result<Option<String>, OrchestrationError> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let secret = secrets
            .get_opt(name)
            .await
            .map_err(|e| kube_error(format!("get secret {namespace}/{name}"), e))?;
        let Some(bytes) = secret.and_then(|s| s.data).and_then(|mut d| d.remove(key)) else {
            return Ok(None);
        };
        String::from_utf8(bytes.0)
            .map(Some)
            .map_err(|_| OrchestrationError::Invalid(format!("secret {name} key {key} is not UTF-8")))
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), OrchestrationError> {
        match self.dynamic(kind, namespace).delete(name, &DeleteParams::background()).await {
            Ok(_) => {
                tracing::debug!(%kind, %namespace, name, "deleted");
                Ok(())
            }
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
            Err(e) => Err(kube_error(format!("delete {kind} {namespace}/{name}"), e)),
        }
    }

    async fn scale_to(&self, namespace: &str, app: &str, replicas: i32) -> Result<(), OrchestrationError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let selector = format!("app={app}");
        let list = deployments
            .list(&ListParams::default().labels(&selector))
            .await
            .map_err(|e| kube_error(format!("list deployments {selector}"), e))?;
        let patch = serde_json::json!({ "spec": { "replicas": replicas } });
        for deployment in list.items {
            let Some(name) = deployment.metadata.name else { continue };
            deployments
                .patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
                .await
                .map_err(|e| kube_error(format!("scale deployment {name}"), e))?;
            tracing::info!(%namespace, deployment = %name, replicas, "scaled");
        }
        Ok(())
    }

    async fn detect_ingress(&self) -> Result<IngressKind, OrchestrationError> {
        let deployments: Api<Deployment> = Api::all(self.client.clone());
        for (selector, kind) in [
            ("app.kubernetes.io/name=traefik", IngressKind::Traefik),
            ("app.kubernetes.io/name=ingress-nginx", IngressKind::Nginx),
        ] {
            let found = deployments
                .list(&ListParams::default().labels(selector).limit(1))
                .await
                .map_err(|e| kube_error("detect ingress controller", e))?;
            if !found.items.is_empty() {
                return Ok(kind);
            }
        }
        Ok(IngressKind::Other)
    }
}
