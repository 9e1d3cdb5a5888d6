// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ingress routes in front of the web service, plus traefik TCP/UDP routes.

use std::collections::BTreeMap;

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, IngressTLS, ServiceBackendPort,
};
use keel_core::ports::WEB_SERVICE;
use keel_core::{PortMap, Protocol};
use serde_json::json;

use super::cert::CERT_SECRET;
use super::{json_meta, meta};
use crate::orchestration::{IngressKind, Resource, ResourceKind};

pub const SSL_INGRESS: &str = "uyuni-ingress-ssl";
pub const NO_SSL_INGRESS: &str = "uyuni-ingress-nossl";
pub const SSL_REDIRECT_INGRESS: &str = "uyuni-ingress-ssl-redirect";

/// Traefik middleware redirecting plain HTTP to HTTPS.
pub const HTTPS_REDIRECT_MIDDLEWARE: &str = "uyuni-https-redirect";

/// Paths served over plain HTTP: clients and bootstrap tooling fetch them without TLS.
const NO_SSL_PATHS: &[&str] = &[
    "/pub",
    "/rhn/([^/])+/DownloadFile",
    "/(rhn/)?rpc/api",
    "/rhn/errors",
    "/rhn/ty/TinyUrl",
    "/rhn/websocket",
    "/rhn/metrics",
    "/cobbler_api",
    "/cblr",
    "/httpboot",
    "/images",
    "/cobbler",
    "/os-images",
    "/tftp",
    "/docs",
];

/// Ingresses of the server, in apply order.
///
/// The SSL ingress carries the issuer annotation when cert-manager issues the
/// certificate: creating it is what triggers the `uyuni-cert` secret.
pub fn ingresses(namespace: &str, fqdn: &str, issuer: Option<&str>, kind: IngressKind) -> Vec<Resource> {
    let mut ingresses = vec![ssl_ingress(namespace, fqdn, issuer, kind), no_ssl_ingress(namespace, fqdn, kind)];
    if kind == IngressKind::Traefik {
        ingresses.push(ssl_redirect_ingress(namespace, fqdn));
    }
    ingresses.into_iter().map(Resource::Ingress).collect()
}

fn ssl_ingress(namespace: &str, fqdn: &str, issuer: Option<&str>, kind: IngressKind) -> Ingress {
    let mut annotations = BTreeMap::new();
    if let Some(issuer) = issuer {
        annotations.insert("cert-manager.io/issuer".to_string(), issuer.to_string());
    }
    if kind == IngressKind::Traefik {
        annotations.insert("traefik.ingress.kubernetes.io/router.tls".to_string(), "true".to_string());
        annotations.insert(
            "traefik.ingress.kubernetes.io/router.tls.domains.n.main".to_string(),
            fqdn.to_string(),
        );
        annotations.insert(
            "traefik.ingress.kubernetes.io/router.entrypoints".to_string(),
            "websecure,web".to_string(),
        );
    }

    ingress(namespace, SSL_INGRESS, annotations, Some(tls(fqdn)), web_rule(fqdn, &["/"]))
}

fn no_ssl_ingress(namespace: &str, fqdn: &str, kind: IngressKind) -> Ingress {
    let mut annotations = BTreeMap::new();
    match kind {
        IngressKind::Nginx => {
            annotations.insert("nginx.ingress.kubernetes.io/ssl-redirect".to_string(), "false".to_string());
        }
        IngressKind::Traefik => {
            annotations.insert("traefik.ingress.kubernetes.io/router.tls".to_string(), "false".to_string());
            annotations.insert("traefik.ingress.kubernetes.io/router.entrypoints".to_string(), "web".to_string());
        }
        IngressKind::Other => {}
    }

    ingress(namespace, NO_SSL_INGRESS, annotations, Some(tls(fqdn)), web_rule(fqdn, NO_SSL_PATHS))
}

/// Nginx redirects on its own; traefik needs a catch-all route through the middleware.
fn ssl_redirect_ingress(namespace: &str, fqdn: &str) -> Ingress {
    let annotations = BTreeMap::from([
        (
            "traefik.ingress.kubernetes.io/router.middlewares".to_string(),
            format!("{namespace}-{HTTPS_REDIRECT_MIDDLEWARE}@kubernetescrd"),
        ),
        ("traefik.ingress.kubernetes.io/router.entrypoints".to_string(), "web".to_string()),
    ]);
    ingress(namespace, SSL_REDIRECT_INGRESS, annotations, None, web_rule(fqdn, &["/"]))
}

fn ingress(
    namespace: &str,
    name: &str,
    annotations: BTreeMap<String, String>,
    tls: Option<IngressTLS>,
    rule: IngressRule,
) -> Ingress {
    let mut metadata = meta(namespace, name, None);
    if !annotations.is_empty() {
        metadata.annotations = Some(annotations);
    }
    Ingress {
        metadata,
        spec: Some(IngressSpec {
            tls: tls.map(|t| vec![t]),
            rules: Some(vec![rule]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn tls(fqdn: &str) -> IngressTLS {
    IngressTLS { hosts: Some(vec![fqdn.to_string()]), secret_name: Some(CERT_SECRET.to_string()) }
}

fn web_rule(fqdn: &str, paths: &[&str]) -> IngressRule {
    let paths = paths
        .iter()
        .map(|path| HTTPIngressPath {
            backend: IngressBackend {
                service: Some(IngressServiceBackend {
                    name: WEB_SERVICE.to_string(),
                    port: Some(ServiceBackendPort { number: Some(80), ..Default::default() }),
                }),
                ..Default::default()
            },
            path: Some(path.to_string()),
            path_type: "Prefix".to_string(),
        })
        .collect();
    IngressRule { host: Some(fqdn.to_string()), http: Some(HTTPIngressRuleValue { paths }) }
}

/// Traefik route exposing one port on the entry point named `<service>-<name>`.
pub fn traefik_route(namespace: &str, port: &PortMap) -> Resource {
    let entry_point = format!("{}-{}", port.service, port.name);
    let service = json!({ "name": port.service, "port": port.exposed });
    let (kind, route) = match port.protocol {
        Protocol::Tcp => {
            (ResourceKind::IngressRouteTcp, json!({ "services": [service], "match": "HostSNI(`*`)" }))
        }
        Protocol::Udp => (ResourceKind::IngressRouteUdp, json!({ "services": [service] })),
    };

    Resource::Custom {
        kind,
        object: json!({
            "apiVersion": kind.api_version(),
            "kind": kind.to_string(),
            "metadata": json_meta(namespace, &format!("{entry_point}-route")),
            "spec": {
                "entryPoints": [entry_point],
                "routes": [route],
            },
        }),
    }
}

/// Middleware used by the SSL redirect ingress.
pub fn https_redirect_middleware(namespace: &str) -> Resource {
    let kind = ResourceKind::Middleware;
    Resource::Custom {
        kind,
        object: json!({
            "apiVersion": kind.api_version(),
            "kind": kind.to_string(),
            "metadata": json_meta(namespace, HTTPS_REDIRECT_MIDDLEWARE),
            "spec": {
                "redirectScheme": { "scheme": "https", "permanent": true },
            },
        }),
    }
}

#[cfg(test)]
#[path = "ingress_tests.rs"]
mod tests;
