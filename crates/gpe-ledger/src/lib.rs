//! # gpe-ledger
//!
//! Ledger data model and access trait for the goal progress engine.
//!
//! The engine never owns financial records — budgets, debts, accounts, and
//! transactions live in a host ledger subsystem. This crate defines the
//! shapes the engine reads and the narrow [`Ledger`] trait it writes
//! through, plus [`MemoryLedger`] for hosts and tests that want everything
//! in-process.
//!
//! ## Key components
//!
//! - [`Account`], [`Budget`], [`Debt`] — ledger entities a goal can link to
//! - [`TransactionDraft`] / [`LedgerTransaction`] — what the engine submits
//!   and what the ledger records
//! - [`Ledger`] — the seam between the engine and the host's finance store
//! - [`MemoryLedger`] — ordered in-memory implementation

pub mod error;
pub mod ledger;
pub mod model;

pub use error::LedgerError;
pub use ledger::{Ledger, MemoryLedger};
pub use model::{
    Account, Budget, BudgetPatch, Debt, DebtDirection, LedgerTransaction, TransactionDirection,
    TransactionDraft,
};
