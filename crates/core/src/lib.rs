// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! keel-core: data model for the keel server deployer

pub mod macros;

pub mod cert;
pub mod config;
pub mod image;
pub mod inspect;
pub mod job;
pub mod migration;
pub mod ports;
pub mod target;
pub mod version;
pub mod volume;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use cert::{strip_text_from_certificate, CertError, CertStrategy, SubjectFields};
pub use config::{
    AdminConfig, DbConfig, EffectiveConfig, HelmConfig, MigrationSource, ServerConfig,
    SideServiceConfig, SslConfig, VolumeConfig, VolumesConfig,
};
pub use image::{ImageConfig, PullPolicy};
pub use inspect::{parse_inspect_data, sanity_check, InspectedConfig, ParseError, SanityError};
pub use job::{JobDescriptor, JobKind, WaitPolicy};
pub use migration::MigrationPayload;
pub use ports::{server_ports, PortMap, Protocol};
pub use target::{validate_fqdn, DeploymentTarget, FqdnError, Lifecycle};
pub use version::{Transition, UnsupportedDowngrade, VersionPair};
pub use volume::{server_mounts, tune_mounts, VolumeMount, VolumeSource};

/// Application label shared by every object the deployer creates.
pub const SERVER_APP: &str = "uyuni";

/// Name of the primary server deployment.
pub const SERVER_DEPLOY_NAME: &str = "uyuni";

/// Claim holding the PostgreSQL data; its presence marks a prior deployment.
pub const DATABASE_VOLUME: &str = "var-pgsql";

/// Default namespace when none is configured.
pub const DEFAULT_NAMESPACE: &str = "default";
