//! Resumable evaluation.
//!
//! When a respondent has no answer yet, evaluation stops and hands back
//! the pending context along with a [`Resumption`]. Resuming reruns the
//! whole tree from the root with a policy that can now answer that
//! context; every earlier turn replays from the policy's own record.

use crate::config::EvalConfig;
use crate::error::EvalResult;
use crate::evaluator::Evaluator;
use crate::respondent::{Policy, Response, StatelessRespondent, Transcript};
use crate::Flow;
use hch_types::Budget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of a resumable run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Completed(String),
    Suspended(Suspension),
}

impl Outcome {
    pub fn completed(&self) -> Option<&str> {
        match self {
            Self::Completed(text) => Some(text),
            Self::Suspended(_) => None,
        }
    }

    pub fn into_suspension(self) -> Option<Suspension> {
        match self {
            Self::Completed(_) => None,
            Self::Suspended(suspension) => Some(suspension),
        }
    }
}

/// A paused evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suspension {
    /// Context awaiting a response; its last observation is pending.
    pub transcript: Transcript,
    pub resume: Resumption,
}

/// Everything needed to start the same evaluation over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resumption {
    pub root: String,
    pub budget: Budget,
    pub config: EvalConfig,
}

impl Resumption {
    /// Rerun from the root with `policy`.
    pub fn resume<P: Policy + 'static>(&self, policy: P) -> EvalResult<Outcome> {
        ResumableHch::new(self.config.clone()).run(&self.root, self.budget, policy)
    }
}

/// Drives an evaluation whose respondent is a policy that may decline.
#[derive(Debug, Clone, Default)]
pub struct ResumableHch {
    config: EvalConfig,
}

impl ResumableHch {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    pub fn run<P: Policy + 'static>(
        &self,
        root: &str,
        budget: Budget,
        policy: P,
    ) -> EvalResult<Outcome> {
        let evaluator = Evaluator::new(self.config.clone());
        let respondent = StatelessRespondent::new(policy).into_shared();
        match evaluator.run(root, budget, respondent)? {
            Flow::Ready(text) => Ok(Outcome::Completed(text)),
            Flow::Suspended(transcript) => {
                tracing::debug!(
                    fingerprint = %transcript.fingerprint(),
                    turns = transcript.responses.len(),
                    "evaluation suspended"
                );
                Ok(Outcome::Suspended(Suspension {
                    transcript,
                    resume: Resumption {
                        root: root.to_string(),
                        budget,
                        config: self.config.clone(),
                    },
                }))
            }
        }
    }
}

/// Recorded answers keyed by transcript fingerprint.
///
/// Declines any context it has not been told about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerBook {
    answers: BTreeMap<String, Response>,
}

impl AnswerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `transcript`'s pending observation with `response`.
    pub fn record(&mut self, transcript: &Transcript, response: Response) {
        self.answers.insert(transcript.fingerprint(), response);
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

impl Policy for AnswerBook {
    fn decide(&self, transcript: &Transcript) -> Option<Response> {
        self.answers.get(&transcript.fingerprint()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_book_suspends_on_root() {
        let outcome = ResumableHch::default()
            .run("hello", 4, AnswerBook::new())
            .unwrap();
        let suspension = outcome.into_suspension().expect("suspended");
        assert_eq!(suspension.transcript.observations.len(), 1);
        assert_eq!(
            suspension.transcript.observations[0].text,
            "hello\n[Remaining budget is 4]"
        );
        assert_eq!(suspension.resume.root, "hello");
    }

    #[test]
    fn test_book_answers_recorded_context() {
        let mut book = AnswerBook::new();
        let suspension = ResumableHch::default()
            .run("hello", 4, book.clone())
            .unwrap()
            .into_suspension()
            .expect("suspended");
        book.record(&suspension.transcript, Response::new("reply hi"));
        let outcome = suspension.resume.resume(book).unwrap();
        assert_eq!(outcome.completed(), Some("hi"));
    }
}
