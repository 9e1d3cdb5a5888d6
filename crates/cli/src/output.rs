// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Final report printed on stdout.

use keel_core::Transition;
use keel_engine::Outcome;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

/// One-paragraph report of a successful run.
pub fn summary(outcome: &Outcome) -> String {
    let mut lines = vec![format!("{} of {} completed", outcome.lifecycle, outcome.fqdn)];
    match outcome.transition {
        Some(Transition::Upgrade) => lines.push("  database: upgraded".to_string()),
        Some(_) => lines.push("  database: unchanged".to_string()),
        None => {}
    }
    if !outcome.jobs.is_empty() {
        let jobs: Vec<&str> = outcome.jobs.iter().map(|j| j.job_name()).collect();
        lines.push(format!("  jobs: {}", jobs.join(", ")));
    }
    lines.push(format!(
        "  certificate: {}",
        outcome.issuer.as_deref().map_or("provided".to_string(), |i| format!("issued by {i}"))
    ));
    if outcome.setup_ran {
        lines.push("  setup: done".to_string());
    }
    lines.join("\n")
}
