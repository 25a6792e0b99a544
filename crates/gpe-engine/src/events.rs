// events.rs — Progress events, the bounded per-goal log, and audit sinks.
//
// Every progress-affecting operation leaves an event behind so the UI can
// explain a percent and an auditor can replay the recent history. The log
// is a strict sliding window: at most `window` entries per goal, oldest
// evicted first on overflow. No sampling, no priority retention.
//
// Sinks mirror the log outward (JSONL files today). A sink failure is
// logged and swallowed — audit export must never take the engine down.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened, with a statically-known payload per kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEventKind {
    /// A track submission was applied (including what was filtered out).
    ContributionApplied {
        track_id: String,
        accepted: usize,
        dropped: usize,
    },

    /// The aggregator recomputed the goal's percent. Appended on every
    /// recompute, even when the percent is unchanged.
    Recomputed { percent: f64, previous_percent: f64 },

    /// A caller set the percent by hand.
    ManualAdjustment { percent: f64, previous_percent: f64 },

    /// The finance bridge materialized a ledger transaction.
    TransactionRecorded {
        transaction_id: String,
        amount: f64,
        currency: String,
    },
}

impl ProgressEventKind {
    /// Event kind name as a string (the serde tag).
    pub fn name(&self) -> &'static str {
        match self {
            ProgressEventKind::ContributionApplied { .. } => "contribution_applied",
            ProgressEventKind::Recomputed { .. } => "recomputed",
            ProgressEventKind::ManualAdjustment { .. } => "manual_adjustment",
            ProgressEventKind::TransactionRecorded { .. } => "transaction_recorded",
        }
    }
}

/// One entry in a goal's audit window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Unique identifier for this event.
    pub event_id: Uuid,

    pub goal_id: String,

    #[serde(flatten)]
    pub kind: ProgressEventKind,

    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Create an event with the current timestamp and a random id.
    pub fn new(goal_id: impl Into<String>, kind: ProgressEventKind) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            goal_id: goal_id.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Receives every event appended to the log, for export.
///
/// Implementations decide what to do with each event: append to a JSONL
/// file, forward to the host's own audit pipeline, etc.
pub trait EventSink: Send {
    /// Handle an event. Errors are logged but don't stop the engine.
    fn send(&self, event: &ProgressEvent) -> std::io::Result<()>;
}

/// Appends events as JSONL to a file (one JSON object per line).
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl EventSink for JsonlSink {
    fn send(&self, event: &ProgressEvent) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

/// Bounded, append-only per-goal event history.
#[derive(Debug)]
pub struct EventLog {
    window: usize,
    events: HashMap<String, Vec<ProgressEvent>>,
}

impl EventLog {
    /// Create a log retaining at most `window` events per goal.
    pub fn new(window: usize) -> Self {
        Self {
            window,
            events: HashMap::new(),
        }
    }

    /// Append an event; evict from the head until the window holds.
    pub fn append(&mut self, event: ProgressEvent) {
        let list = self.events.entry(event.goal_id.clone()).or_default();
        list.push(event);
        if list.len() > self.window {
            let excess = list.len() - self.window;
            list.drain(..excess);
        }
    }

    /// Events for a goal in insertion order, oldest first. Empty for
    /// goals that have never logged anything.
    pub fn events(&self, goal_id: &str) -> &[ProgressEvent] {
        self.events
            .get(goal_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn recomputed(goal_id: &str, percent: f64) -> ProgressEvent {
        ProgressEvent::new(
            goal_id,
            ProgressEventKind::Recomputed {
                percent,
                previous_percent: 0.0,
            },
        )
    }

    #[test]
    fn append_and_read_in_insertion_order() {
        let mut log = EventLog::new(240);
        log.append(recomputed("g1", 10.0));
        log.append(recomputed("g1", 20.0));

        let events = log.events("g1");
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0].kind,
            ProgressEventKind::Recomputed { percent, .. } if percent == 10.0
        ));
    }

    #[test]
    fn window_evicts_oldest_first() {
        let mut log = EventLog::new(240);
        for i in 0..250 {
            log.append(recomputed("g1", i as f64));
        }

        let events = log.events("g1");
        assert_eq!(events.len(), 240);
        // The first 10 were evicted; the head is now event #10.
        assert!(matches!(
            events[0].kind,
            ProgressEventKind::Recomputed { percent, .. } if percent == 10.0
        ));
        assert!(matches!(
            events[239].kind,
            ProgressEventKind::Recomputed { percent, .. } if percent == 249.0
        ));
    }

    #[test]
    fn windows_are_per_goal() {
        let mut log = EventLog::new(2);
        log.append(recomputed("g1", 1.0));
        log.append(recomputed("g1", 2.0));
        log.append(recomputed("g1", 3.0));
        log.append(recomputed("g2", 1.0));

        assert_eq!(log.events("g1").len(), 2);
        assert_eq!(log.events("g2").len(), 1);
    }

    #[test]
    fn unknown_goal_returns_empty_slice() {
        let log = EventLog::new(240);
        assert!(log.events("missing").is_empty());
    }

    #[test]
    fn event_serializes_with_flattened_kind_tag() {
        let event = recomputed("g1", 50.0);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"recomputed\""));
        assert!(json.contains("\"goal_id\":\"g1\""));

        let restored: ProgressEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.kind.name(), "recomputed");
    }

    #[test]
    fn jsonl_sink_appends_one_line_per_event() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("progress-events.jsonl");
        let sink = JsonlSink::new(&path);

        sink.send(&recomputed("g1", 1.0)).unwrap();
        sink.send(&recomputed("g1", 2.0)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("recomputed"));
    }
}
