// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors that abort a reconciliation run.

use std::time::Duration;

use keel_adapters::{ExecError, OrchestrationError, ToolError};
use keel_core::{CertError, FqdnError, ParseError, SanityError, UnsupportedDowngrade};
use thiserror::Error;

/// Why a run stopped. Every variant is terminal for the run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Missing tool, bad input or missing prior deployment; nothing was mutated.
    #[error("{0}")]
    Precondition(String),

    #[error(transparent)]
    InvalidFqdn(#[from] FqdnError),

    /// Incomplete certificate material; nothing was mutated.
    #[error(transparent)]
    Certificate(#[from] CertError),

    #[error(transparent)]
    UnsupportedDowngrade(#[from] UnsupportedDowngrade),

    #[error(transparent)]
    Sanity(#[from] SanityError),

    #[error("timed out after {}s waiting for {what}", waited.as_secs())]
    Timeout { what: String, waited: Duration },

    #[error("job {job} failed: {reason}")]
    JobFailed { job: String, reason: String },

    #[error("server setup failed with exit code {status}: {message}")]
    SetupFailed { status: i32, message: String },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: ParseError,
    },

    #[error("failed to render the {name} script: {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error(transparent)]
    Orchestration(OrchestrationError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Tool(ToolError),
}

impl ReconcileError {
    pub fn precondition(message: impl Into<String>) -> Self {
        ReconcileError::Precondition(message.into())
    }

    /// Process exit code of the error family.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReconcileError::Precondition(_) | ReconcileError::InvalidFqdn(_) | ReconcileError::Certificate(_) => 2,
            ReconcileError::UnsupportedDowngrade(_) | ReconcileError::Sanity(_) => 3,
            ReconcileError::Timeout { .. } => 4,
            ReconcileError::JobFailed { .. } => 5,
            ReconcileError::SetupFailed { .. } => 6,
            _ => 1,
        }
    }
}

impl From<OrchestrationError> for ReconcileError {
    fn from(err: OrchestrationError) -> Self {
        match err {
            OrchestrationError::Timeout { what, waited } => ReconcileError::Timeout { what, waited },
            other => ReconcileError::Orchestration(other),
        }
    }
}

impl From<ToolError> for ReconcileError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Missing(_) => ReconcileError::Precondition(err.to_string()),
            other => ReconcileError::Tool(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
