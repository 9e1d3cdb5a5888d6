// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inspected configuration of an existing deployment.
//!
//! The inspection script prints one `key=value` pair per line. Blank lines,
//! `#` comments and unknown keys are ignored; values may be double-quoted.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to parse inspection or migration output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("missing required key: {0}")]
    MissingKey(&'static str),

    #[error("malformed line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("invalid migration payload: {0}")]
    Yaml(String),

    #[error("found no data file in the migration payload")]
    MissingData,
}

/// Snapshot of an existing deployment, read-only once parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectedConfig {
    /// PostgreSQL major version of the data on the database volume (0 when empty)
    pub current_pg_version: u32,
    /// PostgreSQL major version shipped in the inspected image
    pub image_pg_version: u32,
    /// Dotted product release of the inspected image
    pub product_release: Option<String>,
    pub timezone: Option<String>,
    /// Whether java debug ports were enabled
    pub debug: bool,
    pub db_user: Option<String>,
    pub db_password: Option<String>,
    pub db_name: Option<String>,
    pub db_port: Option<u16>,
    pub has_hub_api: bool,
    pub fqdn: Option<String>,
}

crate::builder! {
    pub struct InspectedConfigBuilder => InspectedConfig {
        set {
            current_pg_version: u32 = 16,
            image_pg_version: u32 = 16,
            product_release: Option<String> = Some("2025.10".to_string()),
            timezone: Option<String> = None,
            debug: bool = false,
            db_user: Option<String> = None,
            db_password: Option<String> = None,
            db_name: Option<String> = None,
            db_port: Option<u16> = None,
            has_hub_api: bool = false,
            fqdn: Option<String> = None,
        }
    }
}

/// Parse the `key=value` output of the inspection script.
pub fn parse_inspect_data(data: &str) -> Result<InspectedConfig, ParseError> {
    let mut config = InspectedConfig::default();
    let mut current_pg = None;
    let mut image_pg = None;

    for (index, raw) in data.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ParseError::MalformedLine { line: index + 1, content: raw.to_string() });
        };
        let key = key.trim();
        let value = unquote(value.trim());

        match key {
            "current_pg_version" => current_pg = Some(parse_number(key, value)?),
            "image_pg_version" => image_pg = Some(parse_number(key, value)?),
            "uyuni_release" | "product_release" => config.product_release = non_empty(value),
            "timezone" => config.timezone = non_empty(value),
            "debug" | "java_debug" => config.debug = parse_bool(key, value)?,
            "db_user" => config.db_user = non_empty(value),
            "db_password" => config.db_password = non_empty(value),
            "db_name" => config.db_name = non_empty(value),
            "db_port" => {
                config.db_port = if value.is_empty() { None } else { Some(parse_number(key, value)?) }
            }
            "has_hubxmlrpc" | "has_hub_api" => config.has_hub_api = parse_bool(key, value)?,
            "fqdn" => config.fqdn = non_empty(value),
            _ => {}
        }
    }

    config.current_pg_version = current_pg.ok_or(ParseError::MissingKey("current_pg_version"))?;
    config.image_pg_version = image_pg.ok_or(ParseError::MissingKey("image_pg_version"))?;
    Ok(config)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ParseError> {
    value
        .parse()
        .map_err(|_| ParseError::InvalidValue { key: key.to_string(), value: value.to_string() })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ParseError::InvalidValue { key: key.to_string(), value: value.to_string() }),
    }
}

/// Refusal to move to the target image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanityError {
    #[error("cannot fetch the PostgreSQL version from the target image")]
    MissingImagePgVersion,

    #[error("cannot downgrade from release {running} to {target}")]
    ReleaseDowngrade { running: String, target: String },
}

/// Check that the target image can replace the running one.
///
/// The release comparison only applies when both sides report a release.
pub fn sanity_check(
    running: Option<&InspectedConfig>,
    target: &InspectedConfig,
) -> Result<(), SanityError> {
    if target.image_pg_version == 0 {
        return Err(SanityError::MissingImagePgVersion);
    }

    let releases = running
        .and_then(|r| r.product_release.as_deref())
        .zip(target.product_release.as_deref());
    if let Some((running, target)) = releases {
        if compare_releases(target, running) == Ordering::Less {
            return Err(SanityError::ReleaseDowngrade {
                running: running.to_string(),
                target: target.to_string(),
            });
        }
    }
    Ok(())
}

/// Compare dotted numeric releases segment by segment.
///
/// Leading digits of each segment are compared; missing segments count as 0,
/// so `5.1` equals `5.1.0`.
pub fn compare_releases(a: &str, b: &str) -> Ordering {
    let a = release_segments(a);
    let b = release_segments(b);
    let len = a.len().max(b.len());
    for i in 0..len {
        let left = a.get(i).copied().unwrap_or(0);
        let right = b.get(i).copied().unwrap_or(0);
        match left.cmp(&right) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn release_segments(release: &str) -> Vec<u64> {
    release
        .trim()
        .split('.')
        .map(|segment| {
            let digits: String = segment.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse().unwrap_or(0)
        })
        .collect()
}

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;
