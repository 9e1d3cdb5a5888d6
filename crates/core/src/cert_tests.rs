// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::inspect::InspectedConfig;

fn payload(ca_key: bool, server_pair: bool) -> MigrationPayload {
    MigrationPayload {
        ca_key: ca_key.then(|| "payload-ca-key".to_string()),
        ca_cert: Some("payload-ca-cert".to_string()),
        server_cert: server_pair.then(|| "payload-cert".to_string()),
        server_key: server_pair.then(|| "payload-key".to_string()),
        inspected: InspectedConfig::default(),
    }
}

fn operator_pair() -> SslConfig {
    SslConfig {
        server_cert: Some("op-cert".into()),
        server_key: Some("op-key".into()),
        ..Default::default()
    }
}

#[test]
fn operator_pair_wins_over_everything() {
    let strategy = CertStrategy::select(&operator_pair(), Some(&payload(true, true)));
    assert_eq!(
        strategy,
        CertStrategy::UseExisting {
            cert: "op-cert".into(),
            key: "op-key".into(),
            ca_root: Some("payload-ca-cert".into()),
        }
    );
}

#[test]
fn operator_ca_key_beats_payload_ca_key() {
    let ssl = SslConfig {
        ca_key: Some("op-ca-key".into()),
        ca_root: Some("op-ca".into()),
        password: Some("pw".into()),
        ..Default::default()
    };
    let strategy = CertStrategy::select(&ssl, Some(&payload(true, false)));
    assert_eq!(
        strategy,
        CertStrategy::ReuseMigratedCa {
            key: "op-ca-key".into(),
            cert: Some("op-ca".into()),
            password: Some("pw".into()),
        }
    );
}

#[test]
fn payload_ca_key_beats_payload_server_pair() {
    let strategy = CertStrategy::select(&SslConfig::default(), Some(&payload(true, true)));
    assert_eq!(strategy.name(), "reuse-migrated-ca");
}

#[test]
fn payload_server_pair_without_ca_key() {
    let strategy = CertStrategy::select(&SslConfig::default(), Some(&payload(false, true)));
    assert_eq!(
        strategy,
        CertStrategy::UseExisting {
            cert: "payload-cert".into(),
            key: "payload-key".into(),
            ca_root: Some("payload-ca-cert".into()),
        }
    );
}

#[test]
fn ca_key_beats_subject_fields() {
    let mut ssl = SslConfig { ca_key: Some("k".into()), ..Default::default() };
    ssl.subject.country = "DE".into();
    ssl.subject.org = "Acme".into();
    assert!(matches!(CertStrategy::select(&ssl, None), CertStrategy::ReuseMigratedCa { .. }));
}

#[test]
fn blank_material_is_ignored() {
    let ssl = SslConfig {
        server_cert: Some("  ".into()),
        server_key: Some("key".into()),
        ca_key: Some("".into()),
        ..Default::default()
    };
    assert!(matches!(CertStrategy::select(&ssl, None), CertStrategy::GenerateNew(_)));
}

#[test]
fn generate_new_carries_subject() {
    let mut ssl = SslConfig::default();
    ssl.subject.cnames = vec!["alias.example.com".into()];
    let CertStrategy::GenerateNew(subject) = CertStrategy::select(&ssl, None) else {
        panic!("expected a generated CA");
    };
    assert_eq!(subject.cnames, vec!["alias.example.com".to_string()]);
}

#[test]
fn ca_key_without_certificate_is_rejected() {
    let ssl = SslConfig { ca_key: Some("op-ca-key".into()), ..Default::default() };
    let strategy = CertStrategy::select(&ssl, None);
    assert_eq!(strategy.validate(), Err(CertError::MissingCaCertificate));
}

#[test]
fn ca_key_with_payload_certificate_is_complete() {
    let ssl = SslConfig { ca_key: Some("op-ca-key".into()), ..Default::default() };
    let strategy = CertStrategy::select(&ssl, Some(&payload(false, false)));
    assert_eq!(strategy.validate(), Ok(()));
}

#[yare::parameterized(
    operator_pair = { super::operator_pair() },
    generated     = { SslConfig::default() },
)]
fn other_strategies_are_complete(ssl: SslConfig) {
    assert_eq!(CertStrategy::select(&ssl, None).validate(), Ok(()));
}

#[test]
fn strips_text_dump() {
    let content = "\
Certificate:
    Data:
        Version: 3 (0x2)
-----BEGIN CERTIFICATE-----
MIIB
-----END CERTIFICATE-----
trailing words
";
    assert_eq!(
        strip_text_from_certificate(content),
        "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n"
    );
}

#[test]
fn strips_keeps_every_block() {
    let content = "a\n-----BEGIN CERTIFICATE-----\nX\n-----END CERTIFICATE-----\nb\n-----BEGIN CERTIFICATE-----\nY\n-----END CERTIFICATE-----\n";
    let stripped = strip_text_from_certificate(content);
    assert_eq!(stripped.matches("BEGIN").count(), 2);
    assert!(!stripped.contains('a'));
}
