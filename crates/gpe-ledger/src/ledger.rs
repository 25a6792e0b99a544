// ledger.rs — The Ledger trait and its in-memory implementation.
//
// The engine talks to the host's finance subsystem through this trait only.
// Reads are plain queries; the only writes the engine ever performs are
// `create_transaction` and `update_budget` (lazy goal linkage), both driven
// by the finance bridge.

use crate::error::LedgerError;
use crate::model::{
    Account, Budget, BudgetPatch, Debt, LedgerTransaction, TransactionDraft,
};

/// Access to the host's transaction/budget/debt subsystem.
///
/// Implementations decide where the records live: the host's document
/// store, a SQL database, or memory. The engine only requires that lookups
/// are cheap and that `create_transaction` assigns a stable id.
pub trait Ledger {
    /// Record a transaction. The ledger assigns the id.
    fn create_transaction(
        &mut self,
        draft: TransactionDraft,
    ) -> Result<LedgerTransaction, LedgerError>;

    /// Budgets whose `linked_goal_id` equals `goal_id`, in storage order.
    fn find_budgets_by_goal(&self, goal_id: &str) -> Vec<Budget>;

    /// Debts whose `linked_goal_id` equals `goal_id`, in storage order.
    fn find_debts_by_goal(&self, goal_id: &str) -> Vec<Debt>;

    /// Look up a budget by id.
    fn budget(&self, budget_id: &str) -> Option<Budget>;

    /// Look up a debt by id.
    fn debt(&self, debt_id: &str) -> Option<Debt>;

    /// Apply a partial update to a budget.
    fn update_budget(&mut self, budget_id: &str, patch: BudgetPatch) -> Result<(), LedgerError>;

    /// All accounts, in storage order. The first one is the arbitrary
    /// fallback the bridge uses when nothing better resolves.
    fn accounts(&self) -> Vec<Account>;
}

/// In-memory ledger backed by ordered `Vec`s.
///
/// Used by tests and by hosts that keep finance state in-process and
/// persist it themselves. Insertion order is preserved so "first match"
/// resolution is deterministic.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    accounts: Vec<Account>,
    budgets: Vec<Budget>,
    debts: Vec<Debt>,
    transactions: Vec<LedgerTransaction>,
    next_transaction_id: u64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&mut self, account: Account) {
        self.accounts.push(account);
    }

    pub fn add_budget(&mut self, budget: Budget) {
        self.budgets.push(budget);
    }

    pub fn add_debt(&mut self, debt: Debt) {
        self.debts.push(debt);
    }

    /// Recorded transactions, oldest first.
    pub fn transactions(&self) -> &[LedgerTransaction] {
        &self.transactions
    }
}

impl Ledger for MemoryLedger {
    fn create_transaction(
        &mut self,
        draft: TransactionDraft,
    ) -> Result<LedgerTransaction, LedgerError> {
        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(LedgerError::TransactionRejected(format!(
                "amount must be a positive finite number, got {}",
                draft.amount
            )));
        }

        self.next_transaction_id += 1;
        let transaction = LedgerTransaction {
            id: format!("txn-{}", self.next_transaction_id),
            direction: draft.direction,
            amount: draft.amount,
            currency: draft.currency,
            account_id: draft.account_id,
            budget_id: draft.budget_id,
            debt_id: draft.debt_id,
            goal_id: draft.goal_id,
            note: draft.note,
            occurred_at: draft.occurred_at,
        };
        self.transactions.push(transaction.clone());
        Ok(transaction)
    }

    fn find_budgets_by_goal(&self, goal_id: &str) -> Vec<Budget> {
        self.budgets
            .iter()
            .filter(|b| b.linked_goal_id.as_deref() == Some(goal_id))
            .cloned()
            .collect()
    }

    fn find_debts_by_goal(&self, goal_id: &str) -> Vec<Debt> {
        self.debts
            .iter()
            .filter(|d| d.linked_goal_id.as_deref() == Some(goal_id))
            .cloned()
            .collect()
    }

    fn budget(&self, budget_id: &str) -> Option<Budget> {
        self.budgets.iter().find(|b| b.id == budget_id).cloned()
    }

    fn debt(&self, debt_id: &str) -> Option<Debt> {
        self.debts.iter().find(|d| d.id == debt_id).cloned()
    }

    fn update_budget(&mut self, budget_id: &str, patch: BudgetPatch) -> Result<(), LedgerError> {
        let budget = self
            .budgets
            .iter_mut()
            .find(|b| b.id == budget_id)
            .ok_or_else(|| LedgerError::BudgetNotFound(budget_id.to_string()))?;

        if let Some(goal_id) = patch.linked_goal_id {
            budget.linked_goal_id = Some(goal_id);
        }
        if let Some(account_id) = patch.account_id {
            budget.account_id = Some(account_id);
        }
        Ok(())
    }

    fn accounts(&self) -> Vec<Account> {
        self.accounts.clone()
    }
}
