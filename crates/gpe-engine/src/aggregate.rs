// aggregate.rs — The progress fold.
//
// This is the single chokepoint where every track's contributions for a
// goal become one percent in [0, 100]. It is a pure function: stores in,
// record out, no I/O and no event-log writes — the engine context appends
// the `recomputed` event around each call so that callers who want to
// avoid log churn gate the call, not the fold.
//
// Metric policy:
//   amount          — finance track's signed sum against the target;
//                     save/spend measure movement toward the target
//                     magnitude, debt_close measures paydown of the
//                     opening balance toward zero
//   count/duration/ — contributions are deltas summed across all tracks
//   custom
//   weight          — contributions are absolute readings; latest wins
//   none            — percent only moves via manual adjustment

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::goal::{FinanceMode, GoalDefinition, MetricType};
use crate::track::{ContributionStore, TrackContribution, TRACK_FINANCE};

/// One track's slice of the story: its raw aggregate and, where the
/// metric makes a share meaningful, its own normalized percent. This is
/// an explainability surface — the dashboard uses it to answer "why is
/// the percent what it is".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackShare {
    /// Raw aggregate for this track (signed sum, or latest reading for
    /// weight metrics).
    pub total: f64,

    /// This track's own contribution as a percent of the goal, when the
    /// metric defines one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
}

/// The current derived progress state for one goal. Always derived by
/// [`recompute`], never hand-edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub goal_id: String,

    /// Clamped to [0, 100].
    pub percent: f64,

    /// Per-track breakdown, keyed by track id.
    pub per_track: BTreeMap<String, TrackShare>,

    pub updated_at: DateTime<Utc>,
}

/// Clamp a ratio into [0, 1] and scale to a percent.
fn to_percent(ratio: f64) -> f64 {
    (ratio.clamp(0.0, 1.0)) * 100.0
}

/// Percent for a progress/denominator pair, honoring the zero-denominator
/// rule: when the span is zero, any contribution at all means done.
fn ratio_percent(progress: f64, denominator: f64, any_contribution: bool) -> f64 {
    if denominator == 0.0 {
        if any_contribution {
            100.0
        } else {
            0.0
        }
    } else {
        to_percent(progress / denominator)
    }
}

fn signed_sum(entries: &[TrackContribution]) -> f64 {
    entries.iter().map(|c| c.value).sum()
}

/// Latest reading by `occurred_at`; later submission wins ties.
fn latest_reading(entries: &[TrackContribution]) -> Option<f64> {
    entries.iter().max_by_key(|c| c.occurred_at).map(|c| c.value)
}

/// Fold every track's contributions for a goal into a fresh record.
///
/// `previous` matters only for `none`-metric goals, whose percent is set
/// manually and must survive recomputes triggered by track churn.
pub fn recompute(
    definition: &GoalDefinition,
    store: &ContributionStore,
    previous: Option<&ProgressRecord>,
    now: DateTime<Utc>,
) -> ProgressRecord {
    let goal_id = definition.goal_id.as_str();
    let tracks = store.tracks_for(goal_id);

    let any_contribution = tracks
        .iter()
        .any(|track_id| !store.track(goal_id, track_id).is_empty());

    let mut per_track: BTreeMap<String, TrackShare> = BTreeMap::new();

    let percent = match definition.metric_type {
        MetricType::Amount => {
            let finance = store.track(goal_id, TRACK_FINANCE);
            let sum = signed_sum(finance);
            let mode = definition.finance_mode.unwrap_or(FinanceMode::Save);

            let (progress, denominator) = match mode {
                FinanceMode::Save => (sum, definition.target_value),
                FinanceMode::Spend => (sum.abs(), definition.target_value.abs()),
                // Opening balance pays down toward zero.
                FinanceMode::DebtClose => (sum, definition.initial_value),
            };
            let percent = ratio_percent(progress, denominator, !finance.is_empty());

            for track_id in tracks {
                let entries = store.track(goal_id, track_id);
                let total = signed_sum(entries);
                let share = if track_id == TRACK_FINANCE {
                    TrackShare {
                        total,
                        percent: Some(percent),
                    }
                } else {
                    // Non-finance tracks don't drive an amount goal; they
                    // are still reported so the UI can show the activity.
                    TrackShare {
                        total,
                        percent: None,
                    }
                };
                per_track.insert(track_id.clone(), share);
            }
            percent
        }

        MetricType::Count | MetricType::Duration | MetricType::Custom => {
            let denominator = definition.target_value - definition.initial_value;
            let mut delta_total = 0.0;
            for track_id in tracks {
                let entries = store.track(goal_id, track_id);
                let total = signed_sum(entries);
                delta_total += total;
                per_track.insert(
                    track_id.clone(),
                    TrackShare {
                        total,
                        percent: Some(ratio_percent(total, denominator, !entries.is_empty())),
                    },
                );
            }
            ratio_percent(delta_total, denominator, any_contribution)
        }

        MetricType::Weight => {
            let denominator = definition.target_value - definition.initial_value;
            // Latest reading across all tracks wins; a weigh-in is a
            // measurement, not a delta.
            let mut current: Option<(DateTime<Utc>, f64)> = None;
            for track_id in tracks {
                let entries = store.track(goal_id, track_id);
                if let Some(value) = latest_reading(entries) {
                    let at = entries
                        .iter()
                        .map(|c| c.occurred_at)
                        .max()
                        .unwrap_or(now);
                    if current.map(|(t, _)| at >= t).unwrap_or(true) {
                        current = Some((at, value));
                    }
                }
                per_track.insert(
                    track_id.clone(),
                    TrackShare {
                        total: latest_reading(entries).unwrap_or(definition.initial_value),
                        percent: None,
                    },
                );
            }
            let reading = current.map(|(_, v)| v).unwrap_or(definition.initial_value);
            ratio_percent(reading - definition.initial_value, denominator, any_contribution)
        }

        MetricType::None => {
            // Manual-only goals: track churn never resets the percent.
            previous.map(|r| r.percent).unwrap_or(0.0)
        }
    };

    ProgressRecord {
        goal_id: goal_id.to_string(),
        percent,
        per_track,
        updated_at: now,
    }
}
