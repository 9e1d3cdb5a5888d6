// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    quiet = { 0, "info,kube=warn" },
    verbose = { 1, "debug,kube=info,hyper=warn,tower=warn" },
    very_verbose = { 3, "trace" },
)]
fn directive_follows_verbosity(verbose: u8, expected: &str) {
    assert_eq!(default_directive(verbose), expected);
}
