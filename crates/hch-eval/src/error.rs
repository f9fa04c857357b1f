//! Evaluation error types.
//!
//! Parse failures never appear here: the parser recovers them into the
//! malformed sentinel or command. Suspension is not an error either; it is
//! [`crate::Flow::Suspended`].

use hch_types::{Budget, ReferentError};
use thiserror::Error;

/// Fatal evaluation errors. Any of these aborts the whole evaluation.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A pointer fell outside its scope, or a channel was instantiated.
    #[error(transparent)]
    Reference(#[from] ReferentError),

    /// An explicit `ask@N` recipient did not resolve to a channel.
    #[error("recipient pointer {index} resolved to a {found}, expected a channel")]
    RecipientTypeMismatch { index: usize, found: &'static str },

    /// Budget arithmetic went negative; an accounting bug.
    #[error("budget invariant violated: spent {spending} of {budget}")]
    BudgetInvariant { budget: Budget, spending: Budget },

    /// Asks nested deeper than the configured ceiling.
    #[error("ask depth {depth} exceeds the limit of {limit}")]
    DepthLimit { depth: usize, limit: usize },

    /// One conversation took more turns than the configured ceiling.
    #[error("conversation took {turns} turns, the limit is {limit}")]
    TurnLimit { turns: usize, limit: usize },

    /// A synchronous run met a respondent that had no answer.
    #[error("respondent declined to answer")]
    RespondentDeclined,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be decoded.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
