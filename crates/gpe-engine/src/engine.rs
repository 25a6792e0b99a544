// engine.rs — The engine context object.
//
// One GoalProgressEngine owns all five stores (registry, contributions,
// derived records, event log, snapshots) as plain struct fields — no
// globals, no ambient state, so several instances can coexist in tests.
// The host drives it with explicit calls after it observes changes in its
// task/habit/finance stores; the engine subscribes to nothing.
//
// Ordering within a goal is exactly invocation order. Idempotent
// contracts (replace-not-append upsert, snapshot upsert-by-key) do the
// work locks would otherwise do; there is no true concurrency here.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use gpe_ledger::Ledger;

use crate::aggregate::{recompute, ProgressRecord};
use crate::bridge::{record_transaction, BridgeOutcome, TransactionRequest};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{EventLog, EventSink, ProgressEvent, ProgressEventKind};
use crate::goal::{GoalDefinition, GoalRegistry};
use crate::snapshot::{ProgressSnapshot, SnapshotStore};
use crate::track::{ContributionStore, TrackContribution};

/// One row of the dashboard projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HomeGoalItem {
    pub goal_id: String,
    pub name: String,
    pub percent: f64,
}

/// Read-only projection of current goal progress in the shape a home
/// dashboard widget expects. Decoupled on purpose: presentation changes
/// never require engine changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeSummary {
    pub has_data: bool,
    pub goals: Vec<HomeGoalItem>,
}

/// The goal progress engine.
///
/// Reconciles task, habit, and finance signals into one explainable
/// percent per goal, keeps a bounded audit window and daily snapshots,
/// and can materialize ledger transactions through the finance bridge.
pub struct GoalProgressEngine {
    config: EngineConfig,
    registry: GoalRegistry,
    contributions: ContributionStore,
    records: HashMap<String, ProgressRecord>,
    log: EventLog,
    snapshots: SnapshotStore,
    sinks: Vec<Box<dyn EventSink>>,
}

impl GoalProgressEngine {
    pub fn new(config: EngineConfig) -> Self {
        let log = EventLog::new(config.event_window);
        Self {
            config,
            registry: GoalRegistry::new(),
            contributions: ContributionStore::new(),
            records: HashMap::new(),
            log,
            snapshots: SnapshotStore::new(),
            sinks: Vec::new(),
        }
    }

    /// Add an audit export sink. Sink failures are logged, never raised.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    // ---- goal CRUD surface -------------------------------------------

    /// Idempotent upsert of a goal definition; last writer wins.
    pub fn register_goal(&mut self, definition: GoalDefinition) {
        self.registry.register(definition);
    }

    /// `None` means "not found" — stale UI state may ask for goals that
    /// no longer exist, and that must never raise.
    pub fn definition(&self, goal_id: &str) -> Option<&GoalDefinition> {
        self.registry.definition(goal_id)
    }

    /// Soft-archive a goal. Its history stays readable.
    pub fn archive_goal(&mut self, goal_id: &str) -> bool {
        self.registry.archive(goal_id)
    }

    // ---- ingest ------------------------------------------------------

    /// Replace the contribution list for `(goal_id, track_id)` and
    /// recompute.
    ///
    /// The caller supplies the full desired state for the track, which
    /// makes repeated delivery harmless. Each call leaves exactly two
    /// events behind (`contribution_applied`, then `recomputed` — always,
    /// even when the percent did not move) and upserts today's snapshot.
    pub fn upsert_track_contributions(
        &mut self,
        goal_id: &str,
        track_id: &str,
        entries: Vec<TrackContribution>,
    ) -> Result<&ProgressRecord, EngineError> {
        if self.registry.definition(goal_id).is_none() {
            return Err(EngineError::GoalNotFound(goal_id.to_string()));
        }

        let outcome = self.contributions.upsert_track(goal_id, track_id, entries);
        self.append_event(ProgressEvent::new(
            goal_id,
            ProgressEventKind::ContributionApplied {
                track_id: track_id.to_string(),
                accepted: outcome.accepted,
                dropped: outcome.dropped,
            },
        ));

        self.recompute_goal(goal_id)
    }

    /// Recompute a goal from its stored contributions without changing
    /// them. Hosts call this after editing the definition (e.g. a new
    /// target) so the percent catches up.
    pub fn recompute_goal(&mut self, goal_id: &str) -> Result<&ProgressRecord, EngineError> {
        let definition = self
            .registry
            .definition(goal_id)
            .ok_or_else(|| EngineError::GoalNotFound(goal_id.to_string()))?;

        let now = Utc::now();
        let record = recompute(
            definition,
            &self.contributions,
            self.records.get(goal_id),
            now,
        );
        let previous_percent = self
            .records
            .get(goal_id)
            .map(|r| r.percent)
            .unwrap_or(0.0);

        tracing::debug!(goal_id, percent = record.percent, "recomputed goal progress");
        self.append_event(ProgressEvent::new(
            goal_id,
            ProgressEventKind::Recomputed {
                percent: record.percent,
                previous_percent,
            },
        ));
        self.snapshots.upsert(ProgressSnapshot::new(
            goal_id,
            now.date_naive(),
            record.percent,
        ));

        self.records.insert(goal_id.to_string(), record);
        Ok(&self.records[goal_id])
    }

    /// Set a goal's percent by hand (the `none`-metric path, also used by
    /// hosts that precompute weekly completion outside the engine).
    ///
    /// Clamped to [0, 100]. For derived metrics the next recompute will
    /// overwrite this — manual adjustment is authoritative only for goals
    /// nothing else measures.
    pub fn set_progress(&mut self, goal_id: &str, percent: f64) -> Result<f64, EngineError> {
        if self.registry.definition(goal_id).is_none() {
            return Err(EngineError::GoalNotFound(goal_id.to_string()));
        }

        let clamped = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            tracing::warn!(goal_id, percent, "non-finite manual percent treated as 0");
            0.0
        };
        let now = Utc::now();
        let previous_percent = self
            .records
            .get(goal_id)
            .map(|r| r.percent)
            .unwrap_or(0.0);

        let record = self
            .records
            .entry(goal_id.to_string())
            .or_insert_with(|| ProgressRecord {
                goal_id: goal_id.to_string(),
                percent: 0.0,
                per_track: Default::default(),
                updated_at: now,
            });
        record.percent = clamped;
        record.updated_at = now;

        self.append_event(ProgressEvent::new(
            goal_id,
            ProgressEventKind::ManualAdjustment {
                percent: clamped,
                previous_percent,
            },
        ));
        self.snapshots
            .upsert(ProgressSnapshot::new(goal_id, now.date_naive(), clamped));

        Ok(clamped)
    }

    // ---- finance bridge ----------------------------------------------

    /// Record a ledger transaction tied to this goal.
    ///
    /// Resolution, polarity, and fallbacks per [`crate::bridge`]. An
    /// unresolvable counterpart returns [`BridgeOutcome::NoTarget`]
    /// rather than an error.
    pub fn record_goal_transaction(
        &mut self,
        goal_id: &str,
        request: &TransactionRequest,
        ledger: &mut dyn Ledger,
    ) -> Result<BridgeOutcome, EngineError> {
        let definition = self
            .registry
            .definition(goal_id)
            .ok_or_else(|| EngineError::GoalNotFound(goal_id.to_string()))?;

        let outcome = record_transaction(
            definition,
            request,
            ledger,
            self.config.base_currency.as_deref(),
        )?;

        if let BridgeOutcome::Recorded { transaction, .. } = &outcome {
            self.append_event(ProgressEvent::new(
                goal_id,
                ProgressEventKind::TransactionRecorded {
                    transaction_id: transaction.id.clone(),
                    amount: transaction.amount,
                    currency: transaction.currency.clone(),
                },
            ));
        }

        Ok(outcome)
    }

    // ---- read surface ------------------------------------------------

    pub fn progress(&self, goal_id: &str) -> Option<&ProgressRecord> {
        self.records.get(goal_id)
    }

    pub fn events(&self, goal_id: &str) -> &[ProgressEvent] {
        self.log.events(goal_id)
    }

    pub fn snapshots_for_date(&self, date: NaiveDate) -> &[ProgressSnapshot] {
        self.snapshots.for_date(date)
    }

    pub fn snapshots_for_goal(&self, goal_id: &str) -> Vec<ProgressSnapshot> {
        self.snapshots.for_goal(goal_id)
    }

    /// The dashboard projection: every unarchived goal with its current
    /// percent (0 until first recompute), in registration order.
    pub fn home_summary(&self) -> HomeSummary {
        let goals: Vec<HomeGoalItem> = self
            .registry
            .definitions()
            .filter(|d| !d.archived)
            .map(|d| HomeGoalItem {
                goal_id: d.goal_id.clone(),
                name: d.name.clone(),
                percent: self
                    .records
                    .get(&d.goal_id)
                    .map(|r| r.percent)
                    .unwrap_or(0.0),
            })
            .collect();

        HomeSummary {
            has_data: !goals.is_empty(),
            goals,
        }
    }

    fn append_event(&mut self, event: ProgressEvent) {
        for sink in &self.sinks {
            if let Err(e) = sink.send(&event) {
                tracing::warn!("event sink error: {}", e);
            }
        }
        self.log.append(event);
    }
}

impl Default for GoalProgressEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
