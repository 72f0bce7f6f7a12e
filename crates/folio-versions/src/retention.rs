//! Retention planning
//!
//! A version survives cleanup if *either* clause protects it:
//!
//! - it is among the `keep_recent_versions` highest-numbered versions, or
//! - it is among the `keep_snapshots` highest-numbered snapshot versions.
//!
//! Unprotected versions are deleted. When `older_than_days` is set, only
//! unprotected versions created before the cutoff are deleted; younger ones
//! survive. Planning is pure so it can be tested without a store.

use crate::version::{Version, VersionRef};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which versions to keep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionPolicy {
    /// Most recent snapshot versions to keep
    #[serde(default)]
    pub keep_snapshots: usize,
    /// Most recent versions to keep regardless of kind
    #[serde(default)]
    pub keep_recent_versions: usize,
    /// Restrict deletion to versions older than this many days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub older_than_days: Option<u32>,
}

impl RetentionPolicy {
    /// Creation time before which unprotected versions may be deleted
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.older_than_days
            .map(|days| now - Duration::days(i64::from(days)))
    }
}

/// Outcome of applying a policy to a version list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPlan {
    /// Survivors, descending by number
    pub retain: Vec<VersionRef>,
    /// Versions to delete, descending by number
    pub delete: Vec<VersionRef>,
}

impl RetentionPlan {
    /// Plan cleanup of `versions` (any order) at time `now`
    #[must_use]
    pub fn compute(versions: &[Version], policy: &RetentionPolicy, now: DateTime<Utc>) -> Self {
        let mut ordered: Vec<&Version> = versions.iter().collect();
        ordered.sort_by(|a, b| b.version_number.cmp(&a.version_number));

        let mut protected: HashSet<u64> = ordered
            .iter()
            .take(policy.keep_recent_versions)
            .map(|v| v.version_number)
            .collect();
        protected.extend(
            ordered
                .iter()
                .filter(|v| v.is_snapshot)
                .take(policy.keep_snapshots)
                .map(|v| v.version_number),
        );

        let cutoff = policy.cutoff(now);
        let mut plan = Self::default();
        for version in ordered {
            let expired = cutoff.map_or(true, |cutoff| version.created_at < cutoff);
            if protected.contains(&version.version_number) || !expired {
                plan.retain.push(version.to_ref());
            } else {
                plan.delete.push(version.to_ref());
            }
        }
        plan
    }

    /// Version numbers retained, ascending
    #[must_use]
    pub fn retained_numbers(&self) -> Vec<u64> {
        let mut numbers: Vec<u64> = self.retain.iter().map(|v| v.version_number).collect();
        numbers.sort_unstable();
        numbers
    }
}

/// Result of a cleanup pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetentionReport {
    pub deleted_count: usize,
    pub remaining_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VersionDraft;
    use folio_events::DocumentId;
    use pretty_assertions::assert_eq;

    fn history(snapshots: &[u64], created_at: impl Fn(u64) -> DateTime<Utc>) -> Vec<Version> {
        (1..=10)
            .map(|n| {
                let draft = VersionDraft::new(
                    DocumentId::new("doc"),
                    "t",
                    format!("v{n}"),
                    created_at(n),
                )
                .snapshot(snapshots.contains(&n));
                Version::from_draft(draft, n)
            })
            .collect()
    }

    #[test]
    fn protection_is_a_union_of_both_clauses() {
        let now = Utc::now();
        let versions = history(&[1, 2], |_| now);
        let policy = RetentionPolicy {
            keep_snapshots: 2,
            keep_recent_versions: 3,
            older_than_days: None,
        };
        let plan = RetentionPlan::compute(&versions, &policy, now);
        assert_eq!(plan.retained_numbers(), vec![1, 2, 8, 9, 10]);
        assert_eq!(plan.delete.len(), 5);
    }

    #[test]
    fn age_cutoff_spares_young_unprotected_versions() {
        let now = Utc::now();
        // v1..v5 are 60 days old, v6..v10 are 1 day old
        let versions = history(&[], |n| {
            if n <= 5 {
                now - Duration::days(60)
            } else {
                now - Duration::days(1)
            }
        });
        let policy = RetentionPolicy {
            keep_snapshots: 0,
            keep_recent_versions: 2,
            older_than_days: Some(30),
        };
        let plan = RetentionPlan::compute(&versions, &policy, now);
        assert_eq!(plan.retained_numbers(), vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn protected_versions_survive_the_cutoff() {
        let now = Utc::now();
        let versions = history(&[1], |_| now - Duration::days(400));
        let policy = RetentionPolicy {
            keep_snapshots: 1,
            keep_recent_versions: 1,
            older_than_days: Some(30),
        };
        let plan = RetentionPlan::compute(&versions, &policy, now);
        assert_eq!(plan.retained_numbers(), vec![1, 10]);
    }

    #[test]
    fn empty_policy_deletes_everything() {
        let now = Utc::now();
        let plan = RetentionPlan::compute(&history(&[3], |_| now), &RetentionPolicy::default(), now);
        assert!(plan.retain.is_empty());
        assert_eq!(plan.delete.len(), 10);
    }

    #[test]
    fn policy_reads_camel_case() {
        let policy: RetentionPolicy =
            serde_json::from_str(r#"{"keepSnapshots":2,"keepRecentVersions":3}"#).unwrap();
        assert_eq!(policy.keep_snapshots, 2);
        assert_eq!(policy.older_than_days, None);
    }
}
