// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    number = { Some("1500"), Some(Duration::from_millis(1500)) },
    padded = { Some(" 20 "), Some(Duration::from_millis(20)) },
    garbage = { Some("fast"), None },
    negative = { Some("-1"), None },
    unset = { None, None },
)]
fn parses_millis(value: Option<&str>, expected: Option<Duration>) {
    assert_eq!(millis(value.map(str::to_string)), expected);
}

#[test]
fn defaults_are_bounded() {
    let settings = Settings::default();
    assert_eq!(settings.poll_interval, Duration::from_secs(2));
    assert_eq!(settings.inspect_wait, WaitPolicy::bounded_secs(60));
    for policy in [settings.ready_wait, settings.cert_secret_wait, settings.issuer_wait] {
        assert!(policy.is_bounded());
    }
}

#[test]
fn override_replaces_only_its_own_wait() {
    std::env::set_var("KEEL_TEST_OVERRIDDEN_WAIT_MS", "90000");
    assert_eq!(
        bounded("KEEL_TEST_OVERRIDDEN_WAIT_MS", WaitPolicy::bounded_secs(60)),
        WaitPolicy::bounded_secs(90)
    );
    assert_eq!(
        bounded("KEEL_TEST_UNSET_WAIT_MS", WaitPolicy::bounded_secs(60)),
        WaitPolicy::bounded_secs(60)
    );
    std::env::remove_var("KEEL_TEST_OVERRIDDEN_WAIT_MS");
}

#[test]
fn inspect_wait_can_be_overridden() {
    std::env::set_var("KEEL_INSPECT_WAIT_MS", "120000");
    let settings = Settings::from_env();
    std::env::remove_var("KEEL_INSPECT_WAIT_MS");
    assert_eq!(settings.inspect_wait, WaitPolicy::bounded_secs(120));
}
