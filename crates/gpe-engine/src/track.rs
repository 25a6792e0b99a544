// track.rs — Per-(goal, track) contribution lists.
//
// A track is a named source of contribution facts: tasks, habits, finance,
// or anything the host defines. The store's one unusual contract is that
// `upsert_track` REPLACES the whole ordered list for that pair — callers
// hand over the full desired state, not a delta. That makes the store
// idempotent under repeated submission and tolerant of out-of-order
// recomputation by the caller.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known track ids. Hosts may use any other string for custom tracks.
pub const TRACK_TASKS: &str = "tasks";
pub const TRACK_HABITS: &str = "habits";
pub const TRACK_FINANCE: &str = "finance";

/// One discrete fact from a track that moves a goal's measured value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackContribution {
    /// Numeric delta, or absolute reading for weight-style metrics.
    pub value: f64,

    /// When the underlying fact happened.
    pub occurred_at: DateTime<Utc>,

    /// Idempotency key. Within one submitted list, entries sharing a key
    /// collapse to the first occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedupe_key: Option<String>,
}

impl TrackContribution {
    pub fn new(value: f64, occurred_at: DateTime<Utc>) -> Self {
        Self {
            value,
            occurred_at,
            dedupe_key: None,
        }
    }

    /// Set the dedupe key and return self.
    pub fn with_dedupe_key(mut self, key: impl Into<String>) -> Self {
        self.dedupe_key = Some(key.into());
        self
    }
}

/// Outcome of one `upsert_track` call: how many entries survived the
/// finite-value and dedupe filters. Feeds the `contribution_applied`
/// audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub accepted: usize,
    pub dropped: usize,
}

/// Ordered contribution lists keyed by (goal, track).
#[derive(Debug, Default)]
pub struct ContributionStore {
    buckets: HashMap<(String, String), Vec<TrackContribution>>,
    /// Track insertion order per goal, for stable breakdown iteration.
    track_order: HashMap<String, Vec<String>>,
}

impl ContributionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the full contribution list for `(goal_id, track_id)`.
    ///
    /// Non-finite values are dropped, and entries whose `dedupe_key`
    /// repeats an earlier entry in the same submission are dropped —
    /// re-submitting the same key is a no-op, not a duplicate. Both are
    /// counted in the returned outcome, never raised as errors.
    pub fn upsert_track(
        &mut self,
        goal_id: &str,
        track_id: &str,
        entries: Vec<TrackContribution>,
    ) -> UpsertOutcome {
        let submitted = entries.len();
        let mut seen_keys: Vec<&str> = Vec::new();
        let mut kept: Vec<TrackContribution> = Vec::with_capacity(entries.len());

        for entry in &entries {
            if !entry.value.is_finite() {
                tracing::warn!(
                    goal_id,
                    track_id,
                    value = entry.value,
                    "dropping malformed contribution"
                );
                continue;
            }
            if let Some(key) = entry.dedupe_key.as_deref() {
                if seen_keys.contains(&key) {
                    continue;
                }
                seen_keys.push(key);
            }
            kept.push(entry.clone());
        }

        let outcome = UpsertOutcome {
            accepted: kept.len(),
            dropped: submitted - kept.len(),
        };

        let order = self.track_order.entry(goal_id.to_string()).or_default();
        if !order.iter().any(|t| t == track_id) {
            order.push(track_id.to_string());
        }
        self.buckets
            .insert((goal_id.to_string(), track_id.to_string()), kept);

        outcome
    }

    /// Contributions for `(goal_id, track_id)`, oldest submission order.
    /// Empty for pairs never written — never an error, so the aggregator
    /// needs no special case for unseen tracks.
    pub fn track(&self, goal_id: &str, track_id: &str) -> &[TrackContribution] {
        self.buckets
            .get(&(goal_id.to_string(), track_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Track ids that have been written for this goal, in first-write order.
    pub fn tracks_for(&self, goal_id: &str) -> &[String] {
        self.track_order
            .get(goal_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
