// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use keel_core::PullPolicy;
use std::io::Write;

#[test]
fn missing_file_argument_gives_defaults() {
    assert_eq!(load(None).unwrap(), ServerConfig::default());
}

#[test]
fn partial_file_keeps_defaults_for_the_rest() {
    let content = r#"
namespace = "uyuni"
timezone = "Europe/Berlin"

[image]
tag = "2025.10"
pull_policy = "Always"

[db]
password = "secret"

[ssl]
cnames = ["alias.example.com"]
org = "Example"

[volumes.database]
size = "200Gi"

[hub_api]
replicas = 1
"#;
    let config = parse(Path::new("keel.toml"), content).unwrap();

    assert_eq!(config.namespace, "uyuni");
    assert_eq!(config.timezone, "Europe/Berlin");
    assert_eq!(config.image.tag, "2025.10");
    assert_eq!(config.image.pull_policy, PullPolicy::Always);
    assert_eq!(config.image.name, "server");
    assert_eq!(config.db.password.as_deref(), Some("secret"));
    assert_eq!(config.db.user, "spacewalk");
    assert_eq!(config.ssl.subject.cnames, vec!["alias.example.com"]);
    assert_eq!(config.ssl.subject.org, "Example");
    assert_eq!(config.volumes.database.size.as_deref(), Some("200Gi"));
    assert_eq!(config.volumes.packages.size.as_deref(), Some("100Gi"));
    assert_eq!(config.hub_api.replicas, 1);
    assert_eq!(config.hub_api.image, "server-hub-xmlrpc-api");
}

#[test]
fn invalid_file_names_the_path() {
    let err = parse(Path::new("keel.toml"), "namespace = [").unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("invalid configuration in keel.toml"));
}

#[test]
fn load_reads_the_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "namespace = \"from-file\"").unwrap();

    let config = load(Some(file.path())).unwrap();
    assert_eq!(config.namespace, "from-file");
}

#[test]
fn unreadable_file_is_a_read_error() {
    let err = load(Some(Path::new("/nonexistent/keel.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
