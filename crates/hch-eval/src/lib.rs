//! HCH evaluator: recursive question answering under a shrinking budget.
//!
//! A respondent answers each rendered message with one command. `reply`
//! ends the conversation; `ask` opens a sub-conversation with a strictly
//! smaller budget; `note`, `view` and `reflect` feed the respondent a new
//! observation. Pointers in messages resolve against the node's scope,
//! and channels let a respondent address a conversation again.
//!
//! ```
//! use hch_eval::{respondent, run, Response, Transcript};
//!
//! let oracle = respondent(|_: &Transcript| Some(Response::new("reply 4")));
//! assert_eq!(run("What is 2 + 2", 10, oracle).unwrap(), "4");
//! ```

/// Unwrap an `EvalResult<Flow<T>>`, returning early on suspension.
macro_rules! ready {
    ($flow:expr) => {
        match $flow? {
            $crate::Flow::Ready(value) => value,
            $crate::Flow::Suspended(transcript) => {
                return Ok($crate::Flow::Suspended(transcript));
            }
        }
    };
}

mod budgeter;
mod config;
mod env;
mod error;
mod evaluator;
mod execute;
mod respondent;
mod resumable;

pub use budgeter::Budgeter;
pub use config::{Accounting, EvalConfig};
pub use env::{Env, Scope};
pub use error::{EvalError, EvalResult};
pub use evaluator::{Answer, Evaluator};
pub use execute::{Execution, HELP_TEXT};
pub use respondent::{
    respondent, Observation, Policy, Respondent, Response, StatelessRespondent, Transcript, Turn,
};
pub use resumable::{AnswerBook, Outcome, ResumableHch, Resumption, Suspension};

use hch_types::Budget;
use std::rc::Rc;

// ── Flow ──────────────────────────────────────────────────────────────

/// Either a value, or the context of a respondent that had no answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow<T> {
    Ready(T),
    Suspended(Transcript),
}

impl<T> Flow<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Flow<U> {
        match self {
            Self::Ready(value) => Flow::Ready(f(value)),
            Self::Suspended(transcript) => Flow::Suspended(transcript),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────

/// Evaluate `root` with the default configuration.
///
/// A respondent that declines to answer is an error here; use
/// [`ResumableHch`] to suspend instead.
pub fn run(root: &str, budget: Budget, respondent: Rc<dyn Respondent>) -> EvalResult<String> {
    match Evaluator::default().run(root, budget, respondent)? {
        Flow::Ready(text) => Ok(text),
        Flow::Suspended(_) => Err(EvalError::RespondentDeclined),
    }
}
