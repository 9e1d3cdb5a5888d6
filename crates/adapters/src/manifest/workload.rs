// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pods, jobs, deployments and services.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, Pod, PodSpec, PodTemplateSpec,
    SecretKeySelector, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use keel_core::ports::{service_ports, HUB_API_PORT, TCP_SERVICE, UDP_SERVICE, WEB_SERVICE};
use keel_core::{server_ports, DbConfig, JobDescriptor, PortMap, PullPolicy, VolumeMount, SERVER_DEPLOY_NAME};

use super::cert::{CA_NAME, CERT_SECRET, DB_SECRET};
use super::{labels, meta, volume_mounts, volumes, COCO_COMPONENT, HUB_API_COMPONENT, SERVER_COMPONENT};
use crate::orchestration::Resource;

/// Attestation deployment.
pub const COCO_DEPLOY_NAME: &str = "uyuni-coco";

/// Hub XML-RPC API deployment.
pub const HUB_API_DEPLOY_NAME: &str = "uyuni-hub-api";

/// Service in front of the hub XML-RPC API.
pub const HUB_API_SERVICE: &str = "hub-api";

/// Where the server reads its TLS certificate and trusted CA.
const TLS_MOUNT_PATH: &str = "/etc/pki/spacewalk-tls";
const CA_MOUNT_PATH: &str = "/etc/pki/trust/anchors";

/// Pod running a shell script once, restart policy `Never`.
pub fn script_pod(
    namespace: &str,
    name: &str,
    image: &str,
    pull_policy: PullPolicy,
    mounts: &[VolumeMount],
    script: &str,
) -> Resource {
    Resource::Pod(Pod {
        metadata: meta(namespace, name, None),
        spec: Some(PodSpec {
            containers: vec![script_container("inspector", image, pull_policy, mounts, script)],
            volumes: Some(volumes(mounts)),
            restart_policy: Some("Never".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    })
}

/// Job running the descriptor's script with `sh -c`. Never retried.
pub fn job(namespace: &str, descriptor: &JobDescriptor) -> Resource {
    Resource::Job(Job {
        metadata: meta(namespace, descriptor.name(), None),
        spec: Some(JobSpec {
            template: PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    containers: vec![script_container(
                        "runner",
                        &descriptor.image,
                        descriptor.pull_policy,
                        &descriptor.mounts,
                        &descriptor.script,
                    )],
                    volumes: Some(volumes(&descriptor.mounts)),
                    restart_policy: Some("Never".to_string()),
                    ..Default::default()
                }),
            },
            backoff_limit: Some(0),
            ..Default::default()
        }),
        ..Default::default()
    })
}

fn script_container(
    name: &str,
    image: &str,
    pull_policy: PullPolicy,
    mounts: &[VolumeMount],
    script: &str,
) -> Container {
    Container {
        name: name.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some(pull_policy.to_string()),
        command: Some(vec!["sh".to_string(), "-c".to_string(), script.to_string()]),
        volume_mounts: Some(volume_mounts(mounts)),
        ..Default::default()
    }
}

/// Settings of the primary server deployment.
#[derive(Debug, Clone)]
pub struct ServerParams {
    pub namespace: String,
    pub image: String,
    pub pull_policy: PullPolicy,
    pub timezone: String,
    pub debug: bool,
    /// Claim mounts, already tuned
    pub mounts: Vec<VolumeMount>,
}

/// Mounts of the certificate secret and the CA config map.
pub fn tls_mounts() -> Vec<VolumeMount> {
    vec![
        VolumeMount::secret("tls-cert", TLS_MOUNT_PATH, CERT_SECRET),
        VolumeMount::config_map("ca-cert", CA_MOUNT_PATH, CA_NAME),
    ]
}

/// The `uyuni` deployment. One replica, recreated on update.
pub fn server_deployment(params: &ServerParams) -> Resource {
    let mut mounts = params.mounts.clone();
    mounts.extend(tls_mounts());

    let ports = server_ports(params.debug)
        .iter()
        .map(|p| ContainerPort {
            name: Some(p.name.clone()),
            container_port: i32::from(p.port),
            protocol: Some(p.protocol.to_string()),
            ..Default::default()
        })
        .collect();

    let container = Container {
        name: SERVER_DEPLOY_NAME.to_string(),
        image: Some(params.image.clone()),
        image_pull_policy: Some(params.pull_policy.to_string()),
        ports: Some(ports),
        env: Some(vec![env_var("TZ", &params.timezone)]),
        volume_mounts: Some(volume_mounts(&mounts)),
        ..Default::default()
    };

    Resource::Deployment(deployment(
        &params.namespace,
        SERVER_DEPLOY_NAME,
        SERVER_COMPONENT,
        1,
        PodSpec { containers: vec![container], volumes: Some(volumes(&mounts)), ..Default::default() },
    ))
}

/// Web, TCP and UDP services of the server.
pub fn server_services(namespace: &str, debug: bool) -> Vec<Resource> {
    let ports = server_ports(debug);
    let web: Vec<&PortMap> = ports.iter().filter(|p| p.name == "http").collect();
    let tcp: Vec<&PortMap> = service_ports(&ports, TCP_SERVICE).collect();
    let udp: Vec<&PortMap> = service_ports(&ports, UDP_SERVICE).collect();

    [(WEB_SERVICE, web), (TCP_SERVICE, tcp), (UDP_SERVICE, udp)]
        .into_iter()
        .filter(|(_, ports)| !ports.is_empty())
        .map(|(name, ports)| Resource::Service(service(namespace, name, SERVER_COMPONENT, &ports)))
        .collect()
}

/// Attestation deployment connecting to the server's database.
pub fn coco_deployment(
    namespace: &str,
    image: &str,
    pull_policy: PullPolicy,
    replicas: u32,
    db: &DbConfig,
) -> Resource {
    let container = Container {
        name: COCO_DEPLOY_NAME.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some(pull_policy.to_string()),
        env: Some(vec![
            env_var(
                "database_connection",
                &format!("jdbc:postgresql://{TCP_SERVICE}:{}/{}", db.port, db.name),
            ),
            secret_env("database_user", DB_SECRET, "username"),
            secret_env("database_password", DB_SECRET, "password"),
        ]),
        ..Default::default()
    };

    Resource::Deployment(deployment(
        namespace,
        COCO_DEPLOY_NAME,
        COCO_COMPONENT,
        replicas,
        PodSpec { containers: vec![container], ..Default::default() },
    ))
}

/// Hub XML-RPC API deployment and its service.
pub fn hub_api(namespace: &str, image: &str, pull_policy: PullPolicy, replicas: u32) -> Vec<Resource> {
    let container = Container {
        name: HUB_API_DEPLOY_NAME.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: Some(pull_policy.to_string()),
        ports: Some(vec![ContainerPort {
            container_port: i32::from(HUB_API_PORT),
            ..Default::default()
        }]),
        env: Some(vec![
            env_var("HUB_API_URL", &format!("http://{WEB_SERVICE}/rpc/api")),
            env_var("HUB_CONNECT_TIMEOUT", "10"),
            env_var("HUB_REQUEST_TIMEOUT", "10"),
            env_var("HUB_CONNECT_USING_SSL", "false"),
        ]),
        ..Default::default()
    };

    let deploy = deployment(
        namespace,
        HUB_API_DEPLOY_NAME,
        HUB_API_COMPONENT,
        replicas,
        PodSpec { containers: vec![container], ..Default::default() },
    );
    let port = hub_api_port();
    vec![
        Resource::Deployment(deploy),
        Resource::Service(service(namespace, HUB_API_SERVICE, HUB_API_COMPONENT, &[&port])),
    ]
}

/// Port of the hub API service, also routed by traefik.
pub fn hub_api_port() -> PortMap {
    PortMap {
        service: HUB_API_SERVICE.to_string(),
        name: "api".to_string(),
        exposed: HUB_API_PORT,
        port: HUB_API_PORT,
        protocol: keel_core::Protocol::Tcp,
    }
}

fn deployment(namespace: &str, name: &str, component: &str, replicas: u32, spec: PodSpec) -> Deployment {
    let selector = labels(Some(component));
    Deployment {
        metadata: meta(namespace, name, Some(component)),
        spec: Some(DeploymentSpec {
            replicas: Some(i32::try_from(replicas).unwrap_or(i32::MAX)),
            selector: LabelSelector { match_labels: Some(selector.clone()), ..Default::default() },
            strategy: Some(DeploymentStrategy {
                type_: Some("Recreate".to_string()),
                ..Default::default()
            }),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(selector), ..Default::default() }),
                spec: Some(spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn service(namespace: &str, name: &str, component: &str, ports: &[&PortMap]) -> Service {
    Service {
        metadata: meta(namespace, name, Some(component)),
        spec: Some(ServiceSpec {
            selector: Some(labels(Some(component))),
            ports: Some(
                ports
                    .iter()
                    .map(|p| ServicePort {
                        name: Some(p.name.clone()),
                        port: i32::from(p.exposed),
                        target_port: Some(IntOrString::Int(i32::from(p.port))),
                        protocol: Some(p.protocol.to_string()),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.to_string()), ..Default::default() }
}

fn secret_env(name: &str, secret: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret.to_string(),
                key: key.to_string(),
                optional: None,
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
#[path = "workload_tests.rs"]
mod tests;
