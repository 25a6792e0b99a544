//! # gpe-engine
//!
//! Cross-domain goal progress engine: reconciles task completions, habit
//! adherence, and financial transactions into one explainable percent per
//! goal, with an auditable bounded history and daily trend snapshots.
//!
//! The host pushes contribution facts in after observing changes in its
//! own stores; the engine subscribes to nothing, owns no persistence, and
//! never performs network I/O. The only writes it makes outside its own
//! state go through the [`gpe_ledger::Ledger`] trait (transaction
//! creation and lazy budget linkage), driven by the finance bridge.
//!
//! ## Key components
//!
//! - [`GoalRegistry`] / [`GoalDefinition`] — declarative goal definitions
//! - [`ContributionStore`] — per-(goal, track) ordered contribution lists
//!   with replace-not-append upsert
//! - [`aggregate::recompute`] — the pure fold from contributions to a
//!   [`ProgressRecord`]
//! - [`EventLog`] — 240-entry sliding audit window per goal
//! - [`SnapshotStore`] — one snapshot per (goal, day) for trend charts
//! - [`bridge`] — resolves a goal's budget/debt counterpart and records
//!   ledger transactions
//! - [`GoalProgressEngine`] — the context object tying it all together

pub mod aggregate;
pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod goal;
pub mod snapshot;
pub mod track;

pub use aggregate::{ProgressRecord, TrackShare};
pub use bridge::{BridgeOutcome, TransactionRequest};
pub use config::{EngineConfig, DEFAULT_EVENT_WINDOW};
pub use engine::{GoalProgressEngine, HomeGoalItem, HomeSummary};
pub use error::EngineError;
pub use events::{EventLog, EventSink, JsonlSink, ProgressEvent, ProgressEventKind};
pub use goal::{FinanceMode, GoalDefinition, GoalRegistry, MetricType};
pub use snapshot::{ProgressSnapshot, SnapshotStore};
pub use track::{
    ContributionStore, TrackContribution, UpsertOutcome, TRACK_FINANCE, TRACK_HABITS, TRACK_TASKS,
};
