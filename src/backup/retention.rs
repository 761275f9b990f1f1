//! Retention policy evaluation
//!
//! Decides which snapshots are still relevant. Three rules each select a
//! subset of the input and a snapshot is relevant when any rule selects it:
//!
//! - keep-last: the `keep_last_n` newest snapshots
//! - keep-monthly: the newest snapshot of each calendar month, for the
//!   latest month and the `keep_monthly_for` months before it
//! - keep-daily: the newest snapshot of each calendar day, for the
//!   `keep_daily_for` days ending on the latest day (always at least that
//!   latest day)
//!
//! Month and day windows are anchored on the newest snapshot, not on the
//! evaluation instant, so a stalled backup job never ages out its own
//! history. Calendar buckets use UTC.
//!
//! Evaluation is pure: the caller supplies `now` and nothing here reads the
//! clock or touches the store.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use super::snapshot::Snapshot;
use crate::config::settings::RetentionPolicy;

/// Outcome of evaluating a policy against a snapshot list
#[derive(Debug, Clone, Serialize)]
pub struct RetentionPlan {
    /// Instant the evaluation was made for
    pub evaluated_at: DateTime<Utc>,
    /// Snapshots to keep, in input order
    pub relevant: Vec<Snapshot>,
    /// Snapshots that may be pruned, in input order
    pub irrelevant: Vec<Snapshot>,
}

impl RetentionPlan {
    /// Whether `name` is kept by the plan
    pub fn is_relevant(&self, name: &str) -> bool {
        self.relevant.iter().any(|s| s.name == name)
    }

    /// Names of the relevant snapshots
    pub fn relevant_names(&self) -> Vec<&str> {
        self.relevant.iter().map(|s| s.name.as_str()).collect()
    }

    /// Names of the irrelevant snapshots
    pub fn irrelevant_names(&self) -> Vec<&str> {
        self.irrelevant.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Evaluate `policy` over `snapshots`
///
/// The relevant and irrelevant sets partition the input by name. Duplicate
/// names in the input are collapsed to their first occurrence.
pub fn evaluate(
    snapshots: &[Snapshot],
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> RetentionPlan {
    let mut seen = HashSet::new();
    let unique: Vec<&Snapshot> = snapshots
        .iter()
        .filter(|s| seen.insert(s.name.as_str()))
        .collect();

    let keep: HashSet<&str> = keep_last(&unique, policy.keep_last_n)
        .into_iter()
        .chain(keep_monthly(&unique, policy.keep_monthly_for))
        .chain(keep_daily(&unique, policy.keep_daily_for))
        .map(|s| s.name.as_str())
        .collect();

    let (relevant, irrelevant): (Vec<&Snapshot>, Vec<&Snapshot>) = unique
        .into_iter()
        .partition(|s| keep.contains(s.name.as_str()));

    RetentionPlan {
        evaluated_at: now,
        relevant: relevant.into_iter().cloned().collect(),
        irrelevant: irrelevant.into_iter().cloned().collect(),
    }
}

/// The `n` newest snapshots
pub fn keep_last<'a>(snapshots: &[&'a Snapshot], n: u32) -> Vec<&'a Snapshot> {
    let mut sorted = snapshots.to_vec();
    sorted.sort_by(|a, b| Snapshot::newest_first(a, b));
    sorted.truncate(n as usize);
    sorted
}

/// Newest snapshot per calendar month, for the latest month and the
/// `months` months before it
pub fn keep_monthly<'a>(snapshots: &[&'a Snapshot], months: u32) -> Vec<&'a Snapshot> {
    newest_per_bucket(snapshots, month_index, |distance| distance <= i64::from(months))
}

/// Newest snapshot per calendar day, for the `days` days ending on the
/// latest day
///
/// The latest day itself is always covered, so `days == 0` behaves like 1.
pub fn keep_daily<'a>(snapshots: &[&'a Snapshot], days: u32) -> Vec<&'a Snapshot> {
    let span = i64::from(days.max(1));
    newest_per_bucket(snapshots, day_index, |distance| distance < span)
}

fn month_index(snapshot: &Snapshot) -> i64 {
    let at = snapshot.modified_at;
    i64::from(at.year()) * 12 + i64::from(at.month0())
}

fn day_index(snapshot: &Snapshot) -> i64 {
    i64::from(snapshot.modified_at.date_naive().num_days_from_ce())
}

/// Group by `bucket`, keep the newest snapshot per bucket, and return the
/// winners of buckets whose distance from the latest bucket passes
/// `in_window`. Newest bucket first.
fn newest_per_bucket<'a, B, W>(
    snapshots: &[&'a Snapshot],
    bucket: B,
    in_window: W,
) -> Vec<&'a Snapshot>
where
    B: Fn(&Snapshot) -> i64,
    W: Fn(i64) -> bool,
{
    let mut newest: BTreeMap<i64, &'a Snapshot> = BTreeMap::new();
    for &snapshot in snapshots {
        newest
            .entry(bucket(snapshot))
            .and_modify(|current| {
                if snapshot.is_newer_than(current) {
                    *current = snapshot;
                }
            })
            .or_insert(snapshot);
    }

    let Some(&latest) = newest.keys().next_back() else {
        return Vec::new();
    };

    newest
        .into_iter()
        .rev()
        .filter(|(key, _)| in_window(latest - key))
        .map(|(_, snapshot)| snapshot)
        .collect()
}
