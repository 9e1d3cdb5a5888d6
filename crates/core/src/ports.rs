// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ports exposed by the server container.

use serde::{Deserialize, Serialize};

use crate::inspect::ParseError;

/// Service carrying the server's TCP ports.
pub const TCP_SERVICE: &str = "uyuni-tcp";

/// Service carrying the server's UDP ports.
pub const UDP_SERVICE: &str = "uyuni-udp";

/// Service in front of the web frontend.
pub const WEB_SERVICE: &str = "web";

/// Port of the hub XML-RPC API.
pub const HUB_API_PORT: u16 = 2830;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

crate::string_enum! {
    Protocol, |s| ParseError::InvalidValue { key: "protocol".into(), value: s };
    Tcp => "TCP",
    Udp => "UDP",
}

/// One container port and where it is exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMap {
    pub service: String,
    pub name: String,
    pub exposed: u16,
    pub port: u16,
    pub protocol: Protocol,
}

impl PortMap {
    fn tcp(name: &str, port: u16) -> Self {
        Self {
            service: TCP_SERVICE.to_string(),
            name: name.to_string(),
            exposed: port,
            port,
            protocol: Protocol::Tcp,
        }
    }

    fn udp(name: &str, port: u16) -> Self {
        Self {
            service: UDP_SERVICE.to_string(),
            name: name.to_string(),
            exposed: port,
            port,
            protocol: Protocol::Udp,
        }
    }

    /// Java debug ports are only exposed when debugging is enabled.
    pub fn is_debug(&self) -> bool {
        self.name.ends_with("-debug")
    }
}

/// Ports of the server container, debug ports only when `debug` is set.
pub fn server_ports(debug: bool) -> Vec<PortMap> {
    let all = [
        PortMap::tcp("http", 80),
        PortMap::tcp("pgsql", 5432),
        PortMap::tcp("exporter", 9187),
        PortMap::tcp("publish", 4505),
        PortMap::tcp("request", 4506),
        PortMap::tcp("cobbler", 25151),
        PortMap::tcp("tasko-jmx", 5556),
        PortMap::tcp("tasko-mtrx", 9800),
        PortMap::tcp("tasko-debug", 8001),
        PortMap::tcp("tomcat-jmx", 5557),
        PortMap::tcp("tomcat-debug", 8003),
        PortMap::tcp("search-debug", 8002),
        PortMap::udp("tftp", 69),
    ];
    all.into_iter().filter(|p| debug || !p.is_debug()).collect()
}

/// Ports of one service.
pub fn service_ports<'a>(ports: &'a [PortMap], service: &'a str) -> impl Iterator<Item = &'a PortMap> {
    ports.iter().filter(move |p| p.service == service)
}

#[cfg(test)]
#[path = "ports_tests.rs"]
mod tests;
