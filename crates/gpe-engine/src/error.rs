// error.rs — Error types for the progress engine.
//
// The expected failure states (malformed contribution, unresolvable
// finance link, unknown goal on a read) are deliberately NOT here — those
// are ordinary return values. This enum covers the genuinely exceptional
// paths: config I/O and ledger write rejections.

use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A mutation referenced a goal the registry has never seen.
    #[error("goal not found: {0}")]
    GoalNotFound(String),

    /// The ledger refused a write the bridge submitted.
    #[error("ledger error: {0}")]
    Ledger(#[from] gpe_ledger::LedgerError),

    /// Failed to read a config file.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to parse a config file.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
