// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data extracted from the source host after the migration transfer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::inspect::{parse_inspect_data, InspectedConfig, ParseError};

const CA_KEY_FILE: &str = "RHN-ORG-PRIVATE-SSL-KEY";
const CA_CERT_FILE: &str = "RHN-ORG-TRUSTED-SSL-CERT";
const SERVER_CERT_FILE: &str = "spacewalk.crt";
const SERVER_KEY_FILE: &str = "spacewalk.key";
const DATA_FILE: &str = "data";

/// Certificates and configuration recovered from the source host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPayload {
    pub ca_key: Option<String>,
    pub ca_cert: Option<String>,
    pub server_cert: Option<String>,
    pub server_key: Option<String>,
    pub inspected: InspectedConfig,
}

impl MigrationPayload {
    /// Parse the extractor output: a YAML mapping of file name to content.
    pub fn parse(output: &str) -> Result<Self, ParseError> {
        if output.trim().is_empty() {
            return Err(ParseError::MissingData);
        }
        let files: BTreeMap<String, String> =
            serde_yaml::from_str(output).map_err(|e| ParseError::Yaml(e.to_string()))?;

        let data = files.get(DATA_FILE).ok_or(ParseError::MissingData)?;
        let file = |name: &str| files.get(name).filter(|c| !c.trim().is_empty()).cloned();

        Ok(Self {
            ca_key: file(CA_KEY_FILE),
            ca_cert: file(CA_CERT_FILE),
            server_cert: file(SERVER_CERT_FILE),
            server_key: file(SERVER_KEY_FILE),
            inspected: parse_inspect_data(data)?,
        })
    }

    /// Server certificate and key, when both were transferred.
    pub fn server_pair(&self) -> Option<(&str, &str)> {
        self.server_cert.as_deref().zip(self.server_key.as_deref())
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
