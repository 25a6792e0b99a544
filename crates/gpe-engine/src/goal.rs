// goal.rs — Goal definitions and the registry.
//
// A GoalDefinition is the declarative half of a goal: what is being
// measured (metric type), how far it goes (target/initial), and which
// financial entities it is tied to. The registry is a plain keyed upsert
// store — cross-entity consistency (budget vs debt linkage) is checked at
// the point of use by the finance bridge, never here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of quantity a goal measures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// A money amount. The finance track drives the percent.
    Amount,
    /// A body-weight style absolute measurement; latest reading wins.
    Weight,
    /// A count of discrete completions (tasks done, sessions held).
    Count,
    /// Accumulated time.
    Duration,
    /// Host-defined delta metric, aggregated like Count.
    Custom,
    /// No measurable metric — progress moves only by manual adjustment.
    None,
}

/// How an amount goal relates to money movement.
///
/// Only meaningful when `metric_type` is [`MetricType::Amount`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinanceMode {
    /// Accumulate toward a target amount (inflows advance the goal).
    Save,
    /// Spend toward a target amount (outflows advance the goal).
    Spend,
    /// Pay an outstanding balance down to zero.
    DebtClose,
}

/// The declarative definition of a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalDefinition {
    /// Host-assigned goal id (document-store key).
    pub goal_id: String,

    /// Human-readable name shown on the dashboard.
    pub name: String,

    /// What kind of quantity this goal measures.
    pub metric_type: MetricType,

    /// Money-movement semantics for amount goals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finance_mode: Option<FinanceMode>,

    /// Where the goal ends.
    pub target_value: f64,

    /// Where the goal started (opening balance for debt_close).
    #[serde(default)]
    pub initial_value: f64,

    /// Currency for amount goals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Budget this goal is linked to, if configured up-front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_budget_id: Option<String>,

    /// Debt this goal is linked to, if configured up-front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_debt_id: Option<String>,

    /// Soft-archive flag. Goals with history are never deleted.
    #[serde(default)]
    pub archived: bool,

    /// When this definition was first registered.
    pub created_at: DateTime<Utc>,

    /// When this definition was last overwritten.
    pub updated_at: DateTime<Utc>,
}

impl GoalDefinition {
    /// Create a definition with the given metric and target; everything
    /// optional starts unset.
    pub fn new(goal_id: impl Into<String>, name: impl Into<String>, metric_type: MetricType, target_value: f64) -> Self {
        let now = Utc::now();
        Self {
            goal_id: goal_id.into(),
            name: name.into(),
            metric_type,
            finance_mode: None,
            target_value,
            initial_value: 0.0,
            currency: None,
            linked_budget_id: None,
            linked_debt_id: None,
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the finance mode and return self (builder pattern).
    pub fn with_finance_mode(mut self, mode: FinanceMode) -> Self {
        self.finance_mode = Some(mode);
        self
    }

    /// Set the initial value and return self.
    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = value;
        self
    }

    /// Set the currency and return self.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Link a budget and return self.
    pub fn with_linked_budget(mut self, budget_id: impl Into<String>) -> Self {
        self.linked_budget_id = Some(budget_id.into());
        self
    }

    /// Link a debt and return self.
    pub fn with_linked_debt(mut self, debt_id: impl Into<String>) -> Self {
        self.linked_debt_id = Some(debt_id.into());
        self
    }
}

/// Keyed store of goal definitions.
///
/// `register` is an idempotent upsert: last writer wins for the
/// declarative fields, `created_at` survives from the first registration.
#[derive(Debug, Default)]
pub struct GoalRegistry {
    goals: HashMap<String, GoalDefinition>,
    /// Registration order, for stable iteration in projections.
    order: Vec<String>,
}

impl GoalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a definition. Returns the previous definition if one existed.
    pub fn register(&mut self, mut definition: GoalDefinition) -> Option<GoalDefinition> {
        definition.updated_at = Utc::now();
        match self.goals.get(&definition.goal_id) {
            Some(existing) => {
                definition.created_at = existing.created_at;
            }
            None => {
                self.order.push(definition.goal_id.clone());
            }
        }
        self.goals.insert(definition.goal_id.clone(), definition)
    }

    /// Look up a definition. `None` means "not found", never an error —
    /// stale UI state may query goals that no longer exist.
    pub fn definition(&self, goal_id: &str) -> Option<&GoalDefinition> {
        self.goals.get(goal_id)
    }

    /// Soft-archive a goal. Returns false if the goal is unknown.
    pub fn archive(&mut self, goal_id: &str) -> bool {
        match self.goals.get_mut(goal_id) {
            Some(definition) => {
                definition.archived = true;
                definition.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// All definitions in registration order.
    pub fn definitions(&self) -> impl Iterator<Item = &GoalDefinition> {
        self.order.iter().filter_map(|id| self.goals.get(id))
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}
