// model.rs — Ledger entity shapes.
//
// These mirror what the host's finance subsystem stores: money accounts,
// budgets, debts, and recorded transactions. The engine reads them when
// resolving a goal's financial counterpart and writes only through the
// Ledger trait. Ids are host-assigned document-store keys, so they are
// plain strings rather than UUIDs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A money account (cash, card, savings...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Host-assigned account id.
    pub id: String,

    /// Human-readable name (e.g. "Main card").
    pub name: String,

    /// ISO-ish currency code (e.g. "UZS", "USD").
    pub currency: String,

    /// Whether this is the user's default account.
    #[serde(default)]
    pub is_default: bool,
}

/// A spending/saving budget a goal can be linked to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    /// Host-assigned budget id.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Currency the budget is denominated in.
    pub currency: String,

    /// Account this budget draws from, if one is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Goal this budget is linked to. Set lazily by the finance bridge
    /// on first use when the linkage was not configured up-front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_goal_id: Option<String>,
}

/// Which way a debt points.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DebtDirection {
    /// The counterparty owes the user — repayments arrive as income.
    OwedToUser,
    /// The user owes the counterparty — repayments leave as expense.
    OwedByUser,
}

/// An outstanding debt a goal can be linked to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debt {
    /// Host-assigned debt id.
    pub id: String,

    /// Human-readable name (usually the counterparty).
    pub name: String,

    /// Currency the debt is denominated in.
    pub currency: String,

    /// Which way the debt points. Determines transaction polarity.
    pub direction: DebtDirection,

    /// Goal this debt is linked to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_goal_id: Option<String>,
}

/// Sign of a recorded transaction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionDirection {
    Income,
    Expense,
}

/// What the engine submits to the ledger.
///
/// The ledger assigns the id; everything else is resolved by the caller
/// (the finance bridge) before submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub direction: TransactionDirection,
    pub amount: f64,
    pub currency: String,

    /// Best-effort: a ledger with no accounts still records the movement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub occurred_at: DateTime<Utc>,
}

/// A transaction as recorded by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Ledger-assigned transaction id.
    pub id: String,

    pub direction: TransactionDirection,
    pub amount: f64,
    pub currency: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub occurred_at: DateTime<Utc>,
}

/// Partial update applied to a budget via [`crate::Ledger::update_budget`].
///
/// Only fields set to `Some` are written; the rest stay as stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BudgetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_goal_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl BudgetPatch {
    /// Patch that links the budget to a goal and changes nothing else.
    pub fn link_goal(goal_id: impl Into<String>) -> Self {
        Self {
            linked_goal_id: Some(goal_id.into()),
            account_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debt_direction_serializes_as_snake_case() {
        let json = serde_json::to_string(&DebtDirection::OwedToUser).unwrap();
        assert_eq!(json, "\"owed_to_user\"");
    }

    #[test]
    fn budget_optional_fields_omitted_from_json() {
        let budget = Budget {
            id: "b1".to_string(),
            name: "Groceries".to_string(),
            currency: "UZS".to_string(),
            account_id: None,
            linked_goal_id: None,
        };
        let json = serde_json::to_string(&budget).unwrap();
        assert!(!json.contains("account_id"));
        assert!(!json.contains("linked_goal_id"));
    }

    #[test]
    fn budget_patch_link_goal_sets_only_linkage() {
        let patch = BudgetPatch::link_goal("g1");
        assert_eq!(patch.linked_goal_id.as_deref(), Some("g1"));
        assert!(patch.account_id.is_none());
    }
}
