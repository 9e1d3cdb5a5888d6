// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poll-until-predicate, shared by every wait against the cluster.

use std::future::Future;
use std::time::Duration;

use keel_core::WaitPolicy;

use crate::orchestration::OrchestrationError;

/// Poll `check` every `interval` until it yields a value.
///
/// `check` returns `Ok(Some(v))` when done, `Ok(None)` to keep waiting, or an
/// error. Terminal errors (see [`OrchestrationError::is_terminal`]) abort the
/// wait; others are logged as warnings and retried. A bounded policy fails with [`OrchestrationError::Timeout`] once
/// its duration has elapsed; an unbounded one only ends on success or a
/// terminal error.
pub async fn poll_until<T, F, Fut>(
    what: &str,
    policy: WaitPolicy,
    interval: Duration,
    mut check: F,
) -> Result<T, OrchestrationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, OrchestrationError>>,
{
    let start = tokio::time::Instant::now();

    loop {
        match check().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) if e.is_terminal() => return Err(e),
            Err(e) => {
                tracing::warn!(%what, error = %e, "poll check failed, retrying");
            }
        }

        if let Some(max) = policy.max {
            if start.elapsed() >= max {
                return Err(OrchestrationError::Timeout { what: what.to_string(), waited: max });
            }
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
#[path = "wait_tests.rs"]
mod tests;
