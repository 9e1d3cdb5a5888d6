// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters between the deployer and the outside world: the cluster API,
//! the server container and host tools.

pub mod exec;
pub mod manifest;
pub mod orchestration;
pub mod subprocess;
pub mod tools;
pub mod wait;

pub use exec::{ExecError, ExecOutput, KubectlExec, RemoteExec};
pub use orchestration::{
    IngressKind, KubeOrchestrator, OrchestrationClient, OrchestrationError, Resource, ResourceKind,
};
pub use tools::{HostTools, SystemTools, ToolError};
pub use wait::poll_until;

#[cfg(any(test, feature = "test-support"))]
pub use exec::{ExecCall, FakeExec};
#[cfg(any(test, feature = "test-support"))]
pub use orchestration::{FakeOrchestrator, OrchestrationCall};
#[cfg(any(test, feature = "test-support"))]
pub use tools::{FakeTools, ToolCall};
