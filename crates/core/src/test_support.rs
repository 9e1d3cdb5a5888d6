// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::inspect::InspectedConfig;

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::inspect::InspectedConfig;
    use crate::version::VersionPair;
    use proptest::prelude::*;

    pub fn arb_pg_version() -> impl Strategy<Value = u32> {
        12u32..20
    }

    pub fn arb_version_pair() -> impl Strategy<Value = VersionPair> {
        (arb_pg_version(), arb_pg_version()).prop_map(|(installed, target)| VersionPair::new(installed, target))
    }

    pub fn arb_inspected() -> impl Strategy<Value = InspectedConfig> {
        (arb_pg_version(), arb_pg_version(), any::<bool>(), any::<bool>()).prop_map(
            |(current, image, debug, hub)| {
                InspectedConfig::builder()
                    .current_pg_version(current)
                    .image_pg_version(image)
                    .debug(debug)
                    .has_hub_api(hub)
                    .build()
            },
        )
    }
}

// ── Fixture text ─────────────────────────────────────────────────────────

/// Render an [`InspectedConfig`] the way the inspection script prints it.
pub fn inspect_output(config: &InspectedConfig) -> String {
    let mut lines = vec![
        format!("current_pg_version={}", config.current_pg_version),
        format!("image_pg_version={}", config.image_pg_version),
        format!("debug={}", config.debug),
        format!("has_hubxmlrpc={}", config.has_hub_api),
    ];
    let optional = [
        ("uyuni_release", config.product_release.as_ref()),
        ("timezone", config.timezone.as_ref()),
        ("db_user", config.db_user.as_ref()),
        ("db_password", config.db_password.as_ref()),
        ("db_name", config.db_name.as_ref()),
        ("fqdn", config.fqdn.as_ref()),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            lines.push(format!("{key}={value}"));
        }
    }
    if let Some(port) = config.db_port {
        lines.push(format!("db_port={port}"));
    }
    lines.join("\n") + "\n"
}

/// Extractor output carrying the given inspection data and optional files.
pub fn extractor_output(data: &InspectedConfig, files: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (name, content) in files {
        out.push_str(&format!("{name}: |2\n"));
        for line in content.lines() {
            out.push_str(&format!("  {line}\n"));
        }
    }
    out.push_str("data: |2\n");
    for line in inspect_output(data).lines() {
        out.push_str(&format!("  {line}\n"));
    }
    out
}
