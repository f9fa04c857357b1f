//! Fixed-budget adapter.
//!
//! A [`Budgeter`] runs every incoming observation through a budgeted HCH
//! tree with the same allotment and answers with the final message's text.
//! The result is an ordinary [`Respondent`], so one tree can answer for
//! another.

use crate::env::Env;
use crate::error::EvalResult;
use crate::evaluator::{Answer, Evaluator};
use crate::respondent::{Observation, Respondent, Response, Turn};
use crate::Flow;
use hch_parser::parse_message;
use hch_types::Budget;
use std::rc::Rc;

/// An HCH tree answering as a single respondent.
///
/// Every question starts over from the same root, so the tree keeps no
/// memory between questions. The hand-off is plain text: the outer tree's
/// rendered observation, budget notice included, is parsed as the inner
/// root message. Slot names such as `#0` therefore become pointers into
/// the inner tree's own scope.
#[derive(Debug, Clone)]
pub struct Budgeter {
    evaluator: Evaluator,
    root: Env,
    budget: Budget,
}

impl Budgeter {
    /// Wrap a tree answered by `respondent`, spending `budget` per question.
    pub fn hch(respondent: Rc<dyn Respondent>, budget: Budget, evaluator: Evaluator) -> Self {
        Self {
            evaluator,
            root: Env::root(respondent),
            budget,
        }
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    pub fn into_shared(self) -> Rc<dyn Respondent> {
        Rc::new(self)
    }
}

impl Respondent for Budgeter {
    fn respond(&self, observation: &Observation) -> EvalResult<Turn> {
        let message = parse_message(&observation.text);
        let Answer { value, .. } =
            match self.evaluator.act(self.root.clone(), message, self.budget, 0)? {
                Flow::Ready(answer) => answer,
                Flow::Suspended(transcript) => return Ok(Turn::Unavailable(transcript)),
            };
        Ok(Turn::Answered {
            response: Response::new(value.to_string()),
            next: Rc::new(self.clone()),
        })
    }
}
