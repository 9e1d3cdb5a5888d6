// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recording fake of the orchestration client.
//!
//! Keeps applied objects in memory and behaves like a cooperative cluster:
//! applied claims bind, applied deployments report their image, applied
//! secrets can be read back, and cert-manager certificates produce their
//! secret. Failures and timeouts are injected per object.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use keel_core::WaitPolicy;
use parking_lot::Mutex;

use super::{IngressKind, OrchestrationClient, OrchestrationError, Resource, ResourceKind};

/// Recorded orchestration call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestrationCall {
    EnsureNamespace { namespace: String },
    Apply { kind: ResourceKind, namespace: String, name: String },
    WaitForReady { kind: ResourceKind, namespace: String, name: String, policy: WaitPolicy },
    WaitForJob { namespace: String, name: String, policy: WaitPolicy },
    Exists { kind: ResourceKind, namespace: String, name: String },
    VolumeBound { namespace: String, name: String },
    RunningImage { namespace: String, deployment: String },
    GetLogs { namespace: String, pod: String },
    GetSecretData { namespace: String, name: String, key: String },
    Delete { kind: ResourceKind, namespace: String, name: String },
    ScaleTo { namespace: String, app: String, replicas: i32 },
    DetectIngress,
}

type ObjectKey = (ResourceKind, String, String);

#[derive(Default)]
struct FakeState {
    calls: Vec<OrchestrationCall>,
    objects: BTreeMap<ObjectKey, Resource>,
    existing: HashSet<ObjectKey>,
    bound_volumes: HashSet<(String, String)>,
    running_images: HashMap<(String, String), String>,
    pod_output: HashMap<String, String>,
    pod_logs: HashMap<String, String>,
    secrets: HashMap<(String, String, String), String>,
    failing_jobs: HashMap<String, String>,
    failing_pods: HashMap<String, String>,
    timeouts: HashSet<(ResourceKind, String)>,
    failing_applies: HashSet<(ResourceKind, String)>,
    failing_logs: HashSet<String>,
    scale_error: Option<String>,
    ingress: IngressKind,
}

/// Fake orchestration client for testing
#[derive(Clone, Default)]
pub struct FakeOrchestrator {
    inner: Arc<Mutex<FakeState>>,
}

fn key(kind: ResourceKind, namespace: &str, name: &str) -> ObjectKey {
    (kind, namespace.to_string(), name.to_string())
}

impl FakeOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bound claim, as left by a previous deployment.
    pub fn with_bound_volume(self, namespace: &str, name: &str) -> Self {
        self.inner.lock().bound_volumes.insert((namespace.to_string(), name.to_string()));
        self
    }

    /// A running deployment using `image`.
    pub fn with_running_image(self, namespace: &str, deployment: &str, image: &str) -> Self {
        {
            let mut inner = self.inner.lock();
            inner
                .running_images
                .insert((namespace.to_string(), deployment.to_string()), image.to_string());
            inner.existing.insert(key(ResourceKind::Deployment, namespace, deployment));
        }
        self
    }

    /// Log output of any pod started from `image`.
    pub fn with_pod_output(self, image: &str, output: &str) -> Self {
        self.inner.lock().pod_output.insert(image.to_string(), output.to_string());
        self
    }

    /// Log output of the named pod, taking precedence over [`Self::with_pod_output`].
    pub fn with_pod_logs(self, pod: &str, output: &str) -> Self {
        self.inner.lock().pod_logs.insert(pod.to_string(), output.to_string());
        self
    }

    pub fn with_secret(self, namespace: &str, name: &str, key_name: &str, value: &str) -> Self {
        {
            let mut inner = self.inner.lock();
            inner.secrets.insert(
                (namespace.to_string(), name.to_string(), key_name.to_string()),
                value.to_string(),
            );
            inner.existing.insert(key(ResourceKind::Secret, namespace, name));
        }
        self
    }

    pub fn with_existing(self, kind: ResourceKind, namespace: &str, name: &str) -> Self {
        self.inner.lock().existing.insert(key(kind, namespace, name));
        self
    }

    pub fn with_ingress(self, ingress: IngressKind) -> Self {
        self.inner.lock().ingress = ingress;
        self
    }

    /// Make the named job fail when waited on.
    pub fn fail_job(self, name: &str, reason: &str) -> Self {
        self.inner.lock().failing_jobs.insert(name.to_string(), reason.to_string());
        self
    }

    /// Make the named pod fail when waited on.
    pub fn fail_pod(self, name: &str, reason: &str) -> Self {
        self.inner.lock().failing_pods.insert(name.to_string(), reason.to_string());
        self
    }

    /// Make readiness waits on the object time out.
    pub fn time_out(self, kind: ResourceKind, name: &str) -> Self {
        self.inner.lock().timeouts.insert((kind, name.to_string()));
        self
    }

    pub fn fail_apply(self, kind: ResourceKind, name: &str) -> Self {
        self.inner.lock().failing_applies.insert((kind, name.to_string()));
        self
    }

    pub fn fail_logs(self, pod: &str) -> Self {
        self.inner.lock().failing_logs.insert(pod.to_string());
        self
    }

    pub fn fail_scale(self, message: &str) -> Self {
        self.inner.lock().scale_error = Some(message.to_string());
        self
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<OrchestrationCall> {
        self.inner.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// `(kind, name)` of every applied object, in order.
    pub fn applied(&self) -> Vec<(ResourceKind, String)> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                OrchestrationCall::Apply { kind, name, .. } => Some((*kind, name.clone())),
                _ => None,
            })
            .collect()
    }

    /// Names of applied objects of one kind, in order.
    pub fn applied_names(&self, kind: ResourceKind) -> Vec<String> {
        self.applied().into_iter().filter(|(k, _)| *k == kind).map(|(_, n)| n).collect()
    }

    /// Index of the first applied `(kind, name)` in the call log.
    pub fn apply_position(&self, kind: ResourceKind, name: &str) -> Option<usize> {
        self.inner.lock().calls.iter().position(|c| {
            matches!(c, OrchestrationCall::Apply { kind: k, name: n, .. } if *k == kind && n == name)
        })
    }

    /// Index of the first call matching `predicate`.
    pub fn position(&self, predicate: impl Fn(&OrchestrationCall) -> bool) -> Option<usize> {
        self.inner.lock().calls.iter().position(predicate)
    }

    /// Last applied version of an object still present.
    pub fn object(&self, kind: ResourceKind, namespace: &str, name: &str) -> Option<Resource> {
        self.inner.lock().objects.get(&key(kind, namespace, name)).cloned()
    }

    fn record(&self, call: OrchestrationCall) {
        self.inner.lock().calls.push(call);
    }
}

fn secret_values(secret: &Secret) -> Vec<(String, String)> {
    let mut values: Vec<(String, String)> = secret
        .data
        .iter()
        .flatten()
        .map(|(k, v)| (k.clone(), String::from_utf8_lossy(&v.0).into_owned()))
        .collect();
    values.extend(secret.string_data.iter().flatten().map(|(k, v)| (k.clone(), v.clone())));
    values
}

impl FakeState {
    /// Simulate what the cluster does in reaction to an applied object.
    fn react(&mut self, resource: &Resource) {
        let namespace = resource.namespace().to_string();
        let name = resource.name().to_string();
        match resource {
            Resource::Claim(_) => {
                self.bound_volumes.insert((namespace, name));
            }
            Resource::Deployment(deployment) => {
                let image = deployment
                    .spec
                    .as_ref()
                    .and_then(|s| s.template.spec.as_ref())
                    .and_then(|s| s.containers.first())
                    .and_then(|c| c.image.clone());
                if let Some(image) = image {
                    self.running_images.insert((namespace, name), image);
                }
            }
            Resource::Secret(secret) => {
                for (k, v) in secret_values(secret) {
                    self.secrets.insert((namespace.clone(), name.clone(), k), v);
                }
            }
            Resource::Custom { kind: ResourceKind::Certificate, object } => {
                let secret_name = object
                    .pointer("/spec/secretName")
                    .and_then(|v| v.as_str())
                    .unwrap_or(&name)
                    .to_string();
                for k in ["ca.crt", "tls.crt", "tls.key"] {
                    self.secrets.insert(
                        (namespace.clone(), secret_name.clone(), k.to_string()),
                        format!("issued-{secret_name}-{k}"),
                    );
                }
                self.existing.insert(key(ResourceKind::Secret, &namespace, &secret_name));
            }
            _ => {}
        }
    }

    fn present(&self, kind: ResourceKind, namespace: &str, name: &str) -> bool {
        let k = key(kind, namespace, name);
        self.objects.contains_key(&k) || self.existing.contains(&k)
    }
}

#[async_trait]
impl OrchestrationClient for FakeOrchestrator {
    async fn ensure_namespace(&self, namespace: &str) -> Result<(), OrchestrationError> {
        self.record(OrchestrationCall::EnsureNamespace { namespace: namespace.to_string() });
        Ok(())
    }

    async fn apply(&self, resources: &[Resource]) -> Result<(), OrchestrationError> {
        let mut inner = self.inner.lock();
        for resource in resources {
            let kind = resource.kind();
            let namespace = resource.namespace().to_string();
            let name = resource.name().to_string();
            inner.calls.push(OrchestrationCall::Apply {
                kind,
                namespace: namespace.clone(),
                name: name.clone(),
            });
            if inner.failing_applies.contains(&(kind, name.clone())) {
                return Err(OrchestrationError::api(format!("apply {kind} {name}"), "injected failure"));
            }
            inner.react(resource);
            inner.objects.insert((kind, namespace, name), resource.clone());
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
        let mut inner = self.inner.lock();
        inner.calls.push(OrchestrationCall::WaitForReady {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
            policy,
        });
        if inner.timeouts.contains(&(kind, name.to_string())) {
            return Err(OrchestrationError::Timeout {
                what: format!("{kind} {namespace}/{name}"),
                waited: policy.max.unwrap_or_default(),
            });
        }
        if kind == ResourceKind::Pod {
            if let Some(reason) = inner.failing_pods.get(name) {
                return Err(OrchestrationError::Failed {
                    what: format!("pod {namespace}/{name}"),
                    reason: reason.clone(),
                });
            }
        }
        Ok(())
    }

    async fn wait_for_job(
        &self,
        namespace: &str,
        name: &str,
        policy: WaitPolicy,
    ) -> Result<(), OrchestrationError> {
        let mut inner = self.inner.lock();
        inner.calls.push(OrchestrationCall::WaitForJob {
            namespace: namespace.to_string(),
            name: name.to_string(),
            policy,
        });
        if let Some(reason) = inner.failing_jobs.get(name) {
            return Err(OrchestrationError::Failed {
                what: format!("job {namespace}/{name}"),
                reason: reason.clone(),
            });
        }
        if policy.is_bounded() && inner.timeouts.contains(&(ResourceKind::Job, name.to_string())) {
            return Err(OrchestrationError::Timeout {
                what: format!("job {namespace}/{name}"),
                waited: policy.max.unwrap_or_default(),
            });
        }
        Ok(())
    }

    async fn exists(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<bool, OrchestrationError> {
        let mut inner = self.inner.lock();
        inner.calls.push(OrchestrationCall::Exists {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        Ok(inner.present(kind, namespace, name))
    }

    async fn volume_bound(&self, namespace: &str, name: &str) -> Result<bool, OrchestrationError> {
        let mut inner = self.inner.lock();
        inner.calls.push(OrchestrationCall::VolumeBound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        Ok(inner.bound_volumes.contains(&(namespace.to_string(), name.to_string())))
    }

    async fn running_image(
        &self,
        namespace: &str,
        deployment: &str,
    ) -> Result<Option<String>, OrchestrationError> {
        let mut inner = self.inner.lock();
        inner.calls.push(OrchestrationCall::RunningImage {
            namespace: namespace.to_string(),
            deployment: deployment.to_string(),
        });
        Ok(inner.running_images.get(&(namespace.to_string(), deployment.to_string())).cloned())
    }

    async fn get_logs(&self, namespace: &str, pod: &str) -> Result<String, OrchestrationError> {
        let mut inner = self.inner.lock();
        inner.calls.push(OrchestrationCall::GetLogs {
            namespace: namespace.to_string(),
            pod: pod.to_string(),
        });
        let op = format!("get logs of pod {namespace}/{pod}");
        if inner.failing_logs.contains(pod) {
            return Err(OrchestrationError::api(op, "injected failure"));
        }
        if !inner.objects.contains_key(&key(ResourceKind::Pod, namespace, pod)) {
            return Err(OrchestrationError::api(op, "pod not found"));
        }
        if let Some(output) = inner.pod_logs.get(pod) {
            return Ok(output.clone());
        }
        let image = match inner.objects.get(&key(ResourceKind::Pod, namespace, pod)) {
            Some(Resource::Pod(p)) => p
                .spec
                .as_ref()
                .and_then(|s| s.containers.first())
                .and_then(|c| c.image.clone()),
            _ => None,
        };
        image
            .and_then(|image| inner.pod_output.get(&image).cloned())
            .ok_or_else(|| OrchestrationError::api(op, "pod not found"))
    }

    async fn get_secret_data(
        &self,
        namespace: &str,
        name: &str,
        key_name: &str,
    ) -> Result<Option<String>, OrchestrationError> {
        let mut inner = self.inner.lock();
        inner.calls.push(OrchestrationCall::GetSecretData {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key_name.to_string(),
        });
        Ok(inner
            .secrets
            .get(&(namespace.to_string(), name.to_string(), key_name.to_string()))
            .cloned())
    }

    async fn delete(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<(), OrchestrationError> {
        let mut inner = self.inner.lock();
        inner.calls.push(OrchestrationCall::Delete {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        let k = key(kind, namespace, name);
        inner.objects.remove(&k);
        inner.existing.remove(&k);
        Ok(())
    }

    async fn scale_to(&self, namespace: &str, app: &str, replicas: i32) -> Result<(), OrchestrationError> {
        let mut inner = self.inner.lock();
        inner.calls.push(OrchestrationCall::ScaleTo {
            namespace: namespace.to_string(),
            app: app.to_string(),
            replicas,
        });
        match &inner.scale_error {
            Some(message) => Err(OrchestrationError::api(format!("scale app={app}"), message)),
            None => Ok(()),
        }
    }

    async fn detect_ingress(&self) -> Result<IngressKind, OrchestrationError> {
        let mut inner = self.inner.lock();
        inner.calls.push(OrchestrationCall::DetectIngress);
        Ok(inner.ingress)
    }
}
