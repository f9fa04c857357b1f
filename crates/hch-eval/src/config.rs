//! Evaluator configuration.

use crate::error::{EvalError, EvalResult};
use hch_types::Budget;
use serde::{Deserialize, Serialize};

/// What a budget counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accounting {
    /// Command steps. Respondents see the remaining budget.
    #[default]
    Steps,
    /// Milliseconds. Each response's elapsed time is charged.
    Time,
}

/// Tunable budget policy.
///
/// Defaults: step accounting, a third of the budget per default ask, no
/// ask surcharge, free non-ask commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub accounting: Accounting,
    /// `K`: an ask without `$N` requests `budget / K`.
    pub default_fraction: Budget,
    /// Added to every ask's spending (0 or 1).
    pub ask_surcharge: Budget,
    /// Spending of reply, note, view, reflect and malformed commands (0 or 1).
    pub command_cost: Budget,
    /// Deepest allowed chain of nested asks.
    pub max_depth: usize,
    /// Most respondent turns one conversation may take before it is cut off.
    pub max_turns: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            accounting: Accounting::Steps,
            default_fraction: 3,
            ask_surcharge: 0,
            command_cost: 0,
            max_depth: 1024,
            max_turns: 1000,
        }
    }
}

impl EvalConfig {
    /// Decode and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> EvalResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value is in range.
    ///
    /// Surcharge and command cost are capped at one unit: an ask hands out
    /// at most `budget - 1`, so one unit is all a command can be charged on
    /// top without the budget going negative.
    pub fn validate(&self) -> EvalResult<()> {
        if self.default_fraction == 0 {
            return Err(EvalError::InvalidConfig(
                "default_fraction must be at least 1".into(),
            ));
        }
        if self.ask_surcharge > 1 {
            return Err(EvalError::InvalidConfig(
                "ask_surcharge must be 0 or 1".into(),
            ));
        }
        if self.command_cost > 1 {
            return Err(EvalError::InvalidConfig(
                "command_cost must be 0 or 1".into(),
            ));
        }
        if self.max_depth == 0 {
            return Err(EvalError::InvalidConfig("max_depth must be at least 1".into()));
        }
        if self.max_turns == 0 {
            return Err(EvalError::InvalidConfig("max_turns must be at least 1".into()));
        }
        Ok(())
    }

    pub fn with_accounting(mut self, accounting: Accounting) -> Self {
        self.accounting = accounting;
        self
    }

    pub fn with_default_fraction(mut self, fraction: Budget) -> Self {
        self.default_fraction = fraction;
        self
    }

    pub fn with_ask_surcharge(mut self, surcharge: Budget) -> Self {
        self.ask_surcharge = surcharge;
        self
    }

    pub fn with_command_cost(mut self, cost: Budget) -> Self {
        self.command_cost = cost;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_turns(mut self, turns: usize) -> Self {
        self.max_turns = turns;
        self
    }
}
