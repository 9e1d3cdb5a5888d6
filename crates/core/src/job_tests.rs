// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    migration    = { JobKind::Migration, "uyuni-migration" },
    db_upgrade   = { JobKind::DbUpgrade, "uyuni-db-upgrade" },
    db_finalize  = { JobKind::DbFinalize, "uyuni-db-finalize" },
    post_upgrade = { JobKind::PostUpgrade, "uyuni-post-upgrade" },
)]
fn job_names_are_fixed(kind: JobKind, name: &str) {
    assert_eq!(kind.job_name(), name);
    assert_eq!(name.parse::<JobKind>().unwrap(), kind);
}

#[test]
fn only_post_upgrade_is_bounded() {
    assert_eq!(JobKind::PostUpgrade.default_wait(), WaitPolicy::bounded_secs(60));
    assert!(!JobKind::Migration.default_wait().is_bounded());
    assert!(!JobKind::DbUpgrade.default_wait().is_bounded());
    assert!(!JobKind::DbFinalize.default_wait().is_bounded());
}

#[test]
fn kinds_order_like_execution() {
    let mut kinds = vec![JobKind::PostUpgrade, JobKind::Migration, JobKind::DbFinalize, JobKind::DbUpgrade];
    kinds.sort();
    assert_eq!(
        kinds,
        vec![JobKind::Migration, JobKind::DbUpgrade, JobKind::DbFinalize, JobKind::PostUpgrade]
    );
}

#[test]
fn descriptor_defaults_wait_from_kind() {
    let job = JobDescriptor::new(JobKind::PostUpgrade, "img:1", PullPolicy::Always).script("true");
    assert_eq!(job.name(), "uyuni-post-upgrade");
    assert_eq!(job.wait, WaitPolicy::bounded_secs(60));
    assert_eq!(job.script, "true");

    let job = JobDescriptor::new(JobKind::DbFinalize, "img:1", PullPolicy::Always);
    assert_eq!(job.wait.max, None);
}

#[test]
fn wait_policy_display() {
    assert_eq!(WaitPolicy::bounded_secs(90).to_string(), "90s");
    assert_eq!(WaitPolicy::unbounded().to_string(), "unbounded");
}
