// bridge.rs — Translating goal progress into ledger transactions.
//
// The bridge is written like a policy evaluation: an ordered chain of
// checks where the first match wins, and an unresolvable chain produces a
// sentinel outcome rather than an error. Resolution order, polarity, and
// the currency/account fallbacks are domain policy and must hold exactly:
//
//   counterpart: explicit id → goal's own linkage → first ledger entity
//                pointing back at the goal
//   direction:   debt owed TO the user → income; everything else → expense
//   currency:    explicit → budget → goal → base → account → debt
//   account:     explicit → budget's account → first account in the
//                resolved currency → first account (best-effort)
//
// The one write besides the transaction itself: a budget used without a
// configured goal link gets linked lazily, idempotently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gpe_ledger::{
    Budget, BudgetPatch, Debt, DebtDirection, Ledger, LedgerTransaction, TransactionDirection,
    TransactionDraft,
};

use crate::error::EngineError;
use crate::goal::GoalDefinition;

/// Caller-supplied parameters for one bridge invocation. Everything
/// optional falls back down the resolution chains above.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TransactionRequest {
    pub fn amount(amount: f64) -> Self {
        Self {
            amount,
            ..Self::default()
        }
    }

    /// Target an explicit budget and return self.
    pub fn with_budget(mut self, budget_id: impl Into<String>) -> Self {
        self.budget_id = Some(budget_id.into());
        self
    }

    /// Target an explicit debt and return self.
    pub fn with_debt(mut self, debt_id: impl Into<String>) -> Self {
        self.debt_id = Some(debt_id.into());
        self
    }

    /// Set the currency and return self.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

/// What the bridge did.
#[derive(Debug, Clone)]
pub enum BridgeOutcome {
    /// A transaction was recorded against the resolved counterpart.
    Recorded {
        transaction: LedgerTransaction,
        /// True when this invocation linked the budget to the goal for
        /// the first time (the lazy-linkage side effect).
        budget_linked: bool,
    },

    /// No budget and no debt could be resolved — nothing happened.
    NoTarget,
}

/// Resolve the financial counterpart and record a transaction.
///
/// A budget-only linkage is valid, a debt-only linkage is valid; neither
/// present short-circuits to [`BridgeOutcome::NoTarget`].
pub fn record_transaction(
    definition: &GoalDefinition,
    request: &TransactionRequest,
    ledger: &mut dyn Ledger,
    base_currency: Option<&str>,
) -> Result<BridgeOutcome, EngineError> {
    let goal_id = definition.goal_id.as_str();

    let budget = resolve_budget(definition, request, ledger);
    let debt = resolve_debt(definition, request, ledger);

    if budget.is_none() && debt.is_none() {
        tracing::debug!(goal_id, "finance bridge found no counterpart");
        return Ok(BridgeOutcome::NoTarget);
    }

    // Polarity: repayments of money owed to the user come in; all other
    // goal-driven movement goes out.
    let direction = match &debt {
        Some(d) if d.direction == DebtDirection::OwedToUser => TransactionDirection::Income,
        _ => TransactionDirection::Expense,
    };

    let preferred_currency =
        currency_before_account(request, budget.as_ref(), definition, base_currency);
    let account = resolve_account(request, budget.as_ref(), preferred_currency.as_deref(), ledger);

    let currency = preferred_currency
        .or_else(|| account.as_ref().map(|a| a.currency.clone()))
        .or_else(|| debt.as_ref().map(|d| d.currency.clone()))
        .unwrap_or_default();

    let draft = TransactionDraft {
        direction,
        amount: request.amount,
        currency,
        account_id: account.map(|a| a.id),
        budget_id: budget.as_ref().map(|b| b.id.clone()),
        debt_id: debt.map(|d| d.id),
        goal_id: Some(goal_id.to_string()),
        note: request.note.clone(),
        occurred_at: request.occurred_at.unwrap_or_else(Utc::now),
    };

    let transaction = ledger.create_transaction(draft)?;
    tracing::debug!(goal_id, transaction_id = %transaction.id, "recorded goal transaction");

    // Lazy linkage: first use of an unlinked budget binds it to the goal.
    // Re-linking an already-linked budget is a no-op.
    let mut budget_linked = false;
    if let Some(budget) = budget {
        if budget.linked_goal_id.as_deref() != Some(goal_id) {
            ledger.update_budget(&budget.id, BudgetPatch::link_goal(goal_id))?;
            budget_linked = true;
        }
    }

    Ok(BridgeOutcome::Recorded {
        transaction,
        budget_linked,
    })
}

/// Counterpart budget: explicit → goal linkage → reverse ledger lookup.
fn resolve_budget(
    definition: &GoalDefinition,
    request: &TransactionRequest,
    ledger: &dyn Ledger,
) -> Option<Budget> {
    if let Some(id) = request.budget_id.as_deref() {
        if let Some(budget) = ledger.budget(id) {
            return Some(budget);
        }
    }
    if let Some(id) = definition.linked_budget_id.as_deref() {
        if let Some(budget) = ledger.budget(id) {
            return Some(budget);
        }
    }
    ledger
        .find_budgets_by_goal(&definition.goal_id)
        .into_iter()
        .next()
}

/// Counterpart debt: explicit → goal linkage → reverse ledger lookup.
fn resolve_debt(
    definition: &GoalDefinition,
    request: &TransactionRequest,
    ledger: &dyn Ledger,
) -> Option<Debt> {
    if let Some(id) = request.debt_id.as_deref() {
        if let Some(debt) = ledger.debt(id) {
            return Some(debt);
        }
    }
    if let Some(id) = definition.linked_debt_id.as_deref() {
        if let Some(debt) = ledger.debt(id) {
            return Some(debt);
        }
    }
    ledger
        .find_debts_by_goal(&definition.goal_id)
        .into_iter()
        .next()
}

/// The currency chain up to (not including) the account fallback. Split
/// out because account resolution itself wants the currency.
fn currency_before_account(
    request: &TransactionRequest,
    budget: Option<&Budget>,
    definition: &GoalDefinition,
    base_currency: Option<&str>,
) -> Option<String> {
    request
        .currency
        .clone()
        .or_else(|| budget.map(|b| b.currency.clone()))
        .or_else(|| definition.currency.clone())
        .or_else(|| base_currency.map(str::to_string))
}

/// Account: explicit → budget's account → currency match → first account.
fn resolve_account(
    request: &TransactionRequest,
    budget: Option<&Budget>,
    currency: Option<&str>,
    ledger: &dyn Ledger,
) -> Option<gpe_ledger::Account> {
    let accounts = ledger.accounts();

    if let Some(id) = request.account_id.as_deref() {
        if let Some(account) = accounts.iter().find(|a| a.id == id) {
            return Some(account.clone());
        }
    }
    if let Some(id) = budget.and_then(|b| b.account_id.as_deref()) {
        if let Some(account) = accounts.iter().find(|a| a.id == id) {
            return Some(account.clone());
        }
    }
    if let Some(currency) = currency {
        if let Some(account) = accounts.iter().find(|a| a.currency == currency) {
            return Some(account.clone());
        }
    }
    accounts.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::{FinanceMode, MetricType};
    use gpe_ledger::{Account, MemoryLedger};

    fn account(id: &str, currency: &str) -> Account {
        Account {
            id: id.to_string(),
            name: id.to_string(),
            currency: currency.to_string(),
            is_default: false,
        }
    }

    fn budget(id: &str, currency: &str, account_id: Option<&str>, goal: Option<&str>) -> Budget {
        Budget {
            id: id.to_string(),
            name: id.to_string(),
            currency: currency.to_string(),
            account_id: account_id.map(str::to_string),
            linked_goal_id: goal.map(str::to_string),
        }
    }

    fn debt(id: &str, direction: DebtDirection, goal: Option<&str>) -> Debt {
        Debt {
            id: id.to_string(),
            name: id.to_string(),
            currency: "USD".to_string(),
            direction,
            linked_goal_id: goal.map(str::to_string),
        }
    }

    fn save_goal(goal_id: &str) -> GoalDefinition {
        GoalDefinition::new(goal_id, "Save up", MetricType::Amount, 1000.0)
            .with_finance_mode(FinanceMode::Save)
    }

    #[test]
    fn no_counterpart_is_a_no_op_not_an_error() {
        let mut ledger = MemoryLedger::new();
        let outcome = record_transaction(
            &save_goal("g1"),
            &TransactionRequest::amount(100.0),
            &mut ledger,
            None,
        )
        .unwrap();

        assert!(matches!(outcome, BridgeOutcome::NoTarget));
        assert!(ledger.transactions().is_empty());
    }

    #[test]
    fn explicit_budget_wins_over_goal_linkage() {
        let mut ledger = MemoryLedger::new();
        ledger.add_budget(budget("b1", "USD", None, None));
        ledger.add_budget(budget("b2", "USD", None, None));

        let definition = save_goal("g1").with_linked_budget("b1");
        let outcome = record_transaction(
            &definition,
            &TransactionRequest::amount(50.0).with_budget("b2"),
            &mut ledger,
            None,
        )
        .unwrap();

        match outcome {
            BridgeOutcome::Recorded { transaction, .. } => {
                assert_eq!(transaction.budget_id.as_deref(), Some("b2"));
            }
            BridgeOutcome::NoTarget => panic!("expected a transaction"),
        }
    }

    #[test]
    fn reverse_lookup_finds_budget_pointing_at_goal() {
        let mut ledger = MemoryLedger::new();
        ledger.add_budget(budget("b9", "USD", None, Some("g1")));

        let outcome = record_transaction(
            &save_goal("g1"),
            &TransactionRequest::amount(50.0),
            &mut ledger,
            None,
        )
        .unwrap();

        match outcome {
            BridgeOutcome::Recorded { transaction, budget_linked } => {
                assert_eq!(transaction.budget_id.as_deref(), Some("b9"));
                // Already linked — no re-link.
                assert!(!budget_linked);
            }
            BridgeOutcome::NoTarget => panic!("expected a transaction"),
        }
    }

    #[test]
    fn debt_owed_to_user_records_income() {
        let mut ledger = MemoryLedger::new();
        ledger.add_debt(debt("d1", DebtDirection::OwedToUser, Some("g1")));

        let outcome = record_transaction(
            &save_goal("g1"),
            &TransactionRequest::amount(50.0),
            &mut ledger,
            None,
        )
        .unwrap();

        match outcome {
            BridgeOutcome::Recorded { transaction, .. } => {
                assert_eq!(transaction.direction, TransactionDirection::Income);
                assert_eq!(transaction.debt_id.as_deref(), Some("d1"));
            }
            BridgeOutcome::NoTarget => panic!("expected a transaction"),
        }
    }

    #[test]
    fn debt_owed_by_user_records_expense() {
        let mut ledger = MemoryLedger::new();
        ledger.add_debt(debt("d1", DebtDirection::OwedByUser, Some("g1")));

        let outcome = record_transaction(
            &save_goal("g1"),
            &TransactionRequest::amount(50.0),
            &mut ledger,
            None,
        )
        .unwrap();

        match outcome {
            BridgeOutcome::Recorded { transaction, .. } => {
                assert_eq!(transaction.direction, TransactionDirection::Expense);
            }
            BridgeOutcome::NoTarget => panic!("expected a transaction"),
        }
    }

    #[test]
    fn currency_falls_back_through_budget_then_goal_then_base() {
        let mut ledger = MemoryLedger::new();
        ledger.add_budget(budget("b1", "UZS", None, Some("g1")));

        // Budget currency wins over goal currency and base.
        let definition = save_goal("g1").with_currency("USD");
        let outcome = record_transaction(
            &definition,
            &TransactionRequest::amount(50.0),
            &mut ledger,
            Some("EUR"),
        )
        .unwrap();

        match outcome {
            BridgeOutcome::Recorded { transaction, .. } => {
                assert_eq!(transaction.currency, "UZS");
            }
            BridgeOutcome::NoTarget => panic!("expected a transaction"),
        }
    }

    #[test]
    fn explicit_currency_wins_over_everything() {
        let mut ledger = MemoryLedger::new();
        ledger.add_budget(budget("b1", "UZS", None, Some("g1")));

        let outcome = record_transaction(
            &save_goal("g1"),
            &TransactionRequest::amount(50.0).with_currency("GBP"),
            &mut ledger,
            Some("EUR"),
        )
        .unwrap();

        match outcome {
            BridgeOutcome::Recorded { transaction, .. } => {
                assert_eq!(transaction.currency, "GBP");
            }
            BridgeOutcome::NoTarget => panic!("expected a transaction"),
        }
    }

    #[test]
    fn account_resolution_prefers_budget_account_then_currency_match() {
        let mut ledger = MemoryLedger::new();
        ledger.add_account(account("a-usd", "USD"));
        ledger.add_account(account("a-uzs", "UZS"));
        ledger.add_budget(budget("b1", "UZS", None, Some("g1")));

        // No explicit account, no budget account — currency match picks a-uzs.
        let outcome = record_transaction(
            &save_goal("g1"),
            &TransactionRequest::amount(50.0),
            &mut ledger,
            None,
        )
        .unwrap();

        match outcome {
            BridgeOutcome::Recorded { transaction, .. } => {
                assert_eq!(transaction.account_id.as_deref(), Some("a-uzs"));
            }
            BridgeOutcome::NoTarget => panic!("expected a transaction"),
        }
    }

    #[test]
    fn first_account_is_the_last_resort() {
        let mut ledger = MemoryLedger::new();
        ledger.add_account(account("a1", "JPY"));
        ledger.add_account(account("a2", "CHF"));
        ledger.add_budget(budget("b1", "UZS", None, Some("g1")));

        let outcome = record_transaction(
            &save_goal("g1"),
            &TransactionRequest::amount(50.0),
            &mut ledger,
            None,
        )
        .unwrap();

        match outcome {
            BridgeOutcome::Recorded { transaction, .. } => {
                assert_eq!(transaction.account_id.as_deref(), Some("a1"));
            }
            BridgeOutcome::NoTarget => panic!("expected a transaction"),
        }
    }

    #[test]
    fn empty_ledger_accounts_still_records_the_movement() {
        let mut ledger = MemoryLedger::new();
        ledger.add_budget(budget("b1", "UZS", None, Some("g1")));

        let outcome = record_transaction(
            &save_goal("g1"),
            &TransactionRequest::amount(50.0),
            &mut ledger,
            None,
        )
        .unwrap();

        match outcome {
            BridgeOutcome::Recorded { transaction, .. } => {
                assert!(transaction.account_id.is_none());
                assert_eq!(transaction.currency, "UZS");
            }
            BridgeOutcome::NoTarget => panic!("expected a transaction"),
        }
    }

    #[test]
    fn unlinked_budget_gets_linked_lazily_and_idempotently() {
        let mut ledger = MemoryLedger::new();
        ledger.add_budget(budget("b1", "UZS", None, None));

        let outcome = record_transaction(
            &save_goal("g1"),
            &TransactionRequest::amount(50.0).with_budget("b1"),
            &mut ledger,
            None,
        )
        .unwrap();
        assert!(matches!(outcome, BridgeOutcome::Recorded { budget_linked: true, .. }));
        assert_eq!(
            ledger.budget("b1").unwrap().linked_goal_id.as_deref(),
            Some("g1")
        );

        // Second invocation: already linked, no re-link.
        let outcome = record_transaction(
            &save_goal("g1"),
            &TransactionRequest::amount(25.0).with_budget("b1"),
            &mut ledger,
            None,
        )
        .unwrap();
        assert!(matches!(outcome, BridgeOutcome::Recorded { budget_linked: false, .. }));
        assert_eq!(
            ledger.budget("b1").unwrap().linked_goal_id.as_deref(),
            Some("g1")
        );
    }
}
