// error.rs — Error types for ledger access.

use thiserror::Error;

/// Errors that can occur when reading or writing ledger records.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger refused to record a transaction (e.g. bad amount).
    #[error("transaction rejected: {0}")]
    TransactionRejected(String),

    /// A budget patch referenced an unknown budget.
    #[error("budget not found: {0}")]
    BudgetNotFound(String),
}
