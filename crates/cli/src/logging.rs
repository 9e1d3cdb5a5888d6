// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress logging on stderr.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter for the verbosity level; `RUST_LOG` wins when set.
pub fn filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info,kube=warn",
        1 => "debug,kube=info,hyper=warn,tower=warn",
        _ => "trace",
    }
}

pub fn init(verbose: u8) {
    tracing_subscriber::registry()
        .with(filter(verbose))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
