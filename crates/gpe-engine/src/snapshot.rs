// snapshot.rs — One progress snapshot per (goal, calendar day).
//
// Snapshots exist so trend charts never have to re-derive history from
// raw contributions. The non-obvious contract: a second write for the
// same (goal, date) REPLACES the existing entry in its bucket rather than
// appending — a goal that recomputes fifty times in a day still leaves
// exactly one point on the chart.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A frozen, one-per-day progress value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressSnapshot {
    pub goal_id: String,
    pub date: NaiveDate,
    pub percent: f64,
}

impl ProgressSnapshot {
    pub fn new(goal_id: impl Into<String>, date: NaiveDate, percent: f64) -> Self {
        Self {
            goal_id: goal_id.into(),
            date,
            percent,
        }
    }
}

/// Day-bucketed snapshot collection with upsert-by-goal within a bucket.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    buckets: HashMap<NaiveDate, Vec<ProgressSnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a snapshot into its day bucket.
    ///
    /// Same (goal, date) → replace in place. New goal for the day →
    /// prepend.
    pub fn upsert(&mut self, snapshot: ProgressSnapshot) {
        let bucket = self.buckets.entry(snapshot.date).or_default();
        match bucket.iter_mut().find(|s| s.goal_id == snapshot.goal_id) {
            Some(existing) => *existing = snapshot,
            None => bucket.insert(0, snapshot),
        }
    }

    /// All goals' snapshots for a day. Empty when nothing was recorded.
    pub fn for_date(&self, date: NaiveDate) -> &[ProgressSnapshot] {
        self.buckets.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// One goal's snapshots across all days, ordered by date — the trend
    /// line the chart draws.
    pub fn for_goal(&self, goal_id: &str) -> Vec<ProgressSnapshot> {
        let mut snapshots: Vec<ProgressSnapshot> = self
            .buckets
            .values()
            .flatten()
            .filter(|s| s.goal_id == goal_id)
            .cloned()
            .collect();
        snapshots.sort_by_key(|s| s.date);
        snapshots
    }
}
