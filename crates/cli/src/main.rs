// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! keel: deploys a Uyuni server on Kubernetes.

mod args;
mod config;
mod exit_error;
mod logging;
mod output;

use anyhow::Result;
use clap::Parser;
use keel_adapters::{KubeOrchestrator, KubectlExec, SystemTools};
use keel_core::ServerConfig;
use keel_engine::{ReconcileDeps, ReconcileError, Reconciler, Request, Settings};

use crate::args::Cli;
use crate::exit_error::ExitError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(exit_error::exit_code(&err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let request = request(&cli)?;
    let settings = Settings::from_env();
    tracing::debug!(
        lifecycle = %request.lifecycle,
        namespace = %request.config.namespace,
        image = %request.config.image.reference(),
        "configuration loaded"
    );

    let orchestrator = KubeOrchestrator::connect(settings.poll_interval)
        .await
        .map_err(|e| ExitError::from(ReconcileError::from(e)))?;
    let deps = ReconcileDeps {
        orchestrator,
        exec: KubectlExec::new(request.config.namespace.clone()),
        tools: SystemTools::new(),
    };

    let outcome = Reconciler::new(deps, settings).run(&request).await.map_err(ExitError::from)?;
    println!("{}", output::summary(&outcome));
    Ok(())
}

/// Configuration file, then `--namespace`, then the subcommand flags.
fn request(cli: &Cli) -> Result<Request, ExitError> {
    let mut config: ServerConfig = config::load(cli.config.as_deref())?;
    if let Some(namespace) = &cli.namespace {
        config.namespace.clone_from(namespace);
    }
    cli.command.apply(&mut config)?;
    Ok(Request { lifecycle: cli.command.lifecycle(), fqdn: cli.command.fqdn().to_string(), config })
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
