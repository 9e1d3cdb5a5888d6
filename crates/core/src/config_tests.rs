// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn payload_with(inspected: InspectedConfig) -> MigrationPayload {
    MigrationPayload { inspected, ..Default::default() }
}

#[test]
fn merge_without_extraction_uses_supplied() {
    let supplied = ServerConfig { timezone: "Europe/Paris".into(), ..Default::default() };
    let effective = EffectiveConfig::merge(&supplied, None, None, "srv.example.com");
    assert_eq!(effective.fqdn, "srv.example.com");
    assert_eq!(effective.timezone, "Europe/Paris");
    assert_eq!(effective.db, DbConfig::default());
    assert_eq!(effective.hub_api_replicas, 0);
}

#[test]
fn inspected_values_win() {
    let supplied = ServerConfig::default();
    let inspected = InspectedConfig::builder()
        .fqdn(Some("old.example.com".into()))
        .timezone(Some("Asia/Tokyo".into()))
        .db_user(Some("uyuni".into()))
        .db_password(Some("pw".into()))
        .db_name(Some("uyunidb".into()))
        .db_port(Some(6543))
        .build();
    let effective = EffectiveConfig::merge(&supplied, Some(&inspected), None, "new.example.com");
    assert_eq!(effective.fqdn, "old.example.com");
    assert_eq!(effective.timezone, "Asia/Tokyo");
    assert_eq!(effective.db.user, "uyuni");
    assert_eq!(effective.db.password.as_deref(), Some("pw"));
    assert_eq!(effective.db.name, "uyunidb");
    assert_eq!(effective.db.port, 6543);
}

#[test]
fn inspected_wins_over_payload() {
    let inspected = InspectedConfig::builder().timezone(Some("UTC".into())).build();
    let payload = payload_with(
        InspectedConfig::builder()
            .timezone(Some("America/Lima".into()))
            .db_password(Some("from-source".into()))
            .build(),
    );
    let effective =
        EffectiveConfig::merge(&ServerConfig::default(), Some(&inspected), Some(&payload), "a.example.com");
    assert_eq!(effective.timezone, "UTC");
    assert_eq!(effective.db.password.as_deref(), Some("from-source"));
}

#[test]
fn payload_hub_raises_replicas() {
    let payload = payload_with(InspectedConfig::builder().has_hub_api(true).build());
    let effective = EffectiveConfig::merge(&ServerConfig::default(), None, Some(&payload), "a.example.com");
    assert_eq!(effective.hub_api_replicas, 1);
}

#[test]
fn payload_hub_keeps_higher_replicas() {
    let mut supplied = ServerConfig::default();
    supplied.hub_api.replicas = 3;
    let payload = payload_with(InspectedConfig::builder().has_hub_api(true).build());
    let effective = EffectiveConfig::merge(&supplied, None, Some(&payload), "a.example.com");
    assert_eq!(effective.hub_api_replicas, 3);
}

#[test]
fn inspected_hub_does_not_raise_replicas() {
    let inspected = InspectedConfig::builder().has_hub_api(true).build();
    let effective = EffectiveConfig::merge(&ServerConfig::default(), Some(&inspected), None, "a.example.com");
    assert_eq!(effective.hub_api_replicas, 0);
}

#[test]
fn debug_from_either_side() {
    let inspected = InspectedConfig::builder().debug(true).build();
    assert!(EffectiveConfig::merge(&ServerConfig::default(), Some(&inspected), None, "a.b").debug);
    let supplied = ServerConfig { debug: true, ..Default::default() };
    assert!(EffectiveConfig::merge(&supplied, None, None, "a.b").debug);
}

#[test]
fn toml_fills_defaults() {
    let config: ServerConfig = toml::from_str(
        r#"
        namespace = "uyuni"
        timezone = "Europe/Berlin"

        [image]
        tag = "2025.10"

        [ssl]
        country = "DE"
        cnames = ["alias.example.com"]

        [volumes.database]
        size = "200Gi"

        [hub_api]
        replicas = 1
        "#,
    )
    .unwrap();
    assert_eq!(config.namespace, "uyuni");
    assert_eq!(config.image.tag, "2025.10");
    assert_eq!(config.image.name, "server");
    assert_eq!(config.ssl.subject.country, "DE");
    assert_eq!(config.ssl.subject.cnames, vec!["alias.example.com".to_string()]);
    assert_eq!(config.volumes.database.size.as_deref(), Some("200Gi"));
    assert_eq!(config.volumes.packages.size.as_deref(), Some("100Gi"));
    assert_eq!(config.hub_api.replicas, 1);
    assert_eq!(config.hub_api.image, "server-hub-xmlrpc-api");
    assert_eq!(config.db.port, 5432);
}
