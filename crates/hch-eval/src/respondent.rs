//! The respondent capability: whoever answers a rendered message.
//!
//! A respondent is an immutable snapshot. Answering returns the response
//! together with the next snapshot, so the evaluator never mutates one a
//! channel may still point at.

use crate::error::EvalResult;
use hch_types::Budget;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::rc::Rc;

/// Rendered text shown to a respondent, with the budget it has left.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    pub text: String,
    pub budget: Budget,
}

/// What a respondent typed, and how long it took (time accounting only).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    #[serde(default)]
    pub elapsed: Budget,
}

impl Response {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            elapsed: 0,
        }
    }

    pub fn timed(text: impl Into<String>, elapsed: Budget) -> Self {
        Self {
            text: text.into(),
            elapsed,
        }
    }
}

/// Everything one respondent has seen and said, oldest first.
///
/// Holds one more observation than responses while a response is pending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transcript {
    pub observations: Vec<Observation>,
    pub responses: Vec<Response>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// This transcript with `observation` appended.
    pub fn observed(mut self, observation: Observation) -> Self {
        self.observations.push(observation);
        self
    }

    /// This transcript with `response` appended.
    pub fn answered(mut self, response: Response) -> Self {
        self.responses.push(response);
        self
    }

    /// The observation awaiting a response, if any.
    pub fn pending(&self) -> Option<&Observation> {
        if self.observations.len() > self.responses.len() {
            self.observations.last()
        } else {
            None
        }
    }

    /// Hex SHA-256 over every entry, length-prefixed.
    ///
    /// Equal transcripts always have equal fingerprints, so the value can
    /// key stored answers for a suspended context.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.observations.len() as u64).to_le_bytes());
        for observation in &self.observations {
            hasher.update((observation.text.len() as u64).to_le_bytes());
            hasher.update(observation.text.as_bytes());
            hasher.update(observation.budget.to_le_bytes());
        }
        hasher.update((self.responses.len() as u64).to_le_bytes());
        for response in &self.responses {
            hasher.update((response.text.len() as u64).to_le_bytes());
            hasher.update(response.text.as_bytes());
            hasher.update(response.elapsed.to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, observation) in self.observations.iter().enumerate() {
            if i > 0 {
                f.write_str("\n\n")?;
            }
            f.write_str(&observation.text)?;
            if let Some(response) = self.responses.get(i) {
                write!(f, "\n\n>>> {}", response.text)?;
            }
        }
        Ok(())
    }
}

/// Outcome of offering an observation to a respondent.
pub enum Turn {
    /// The respondent answered; `next` is its updated snapshot.
    Answered {
        response: Response,
        next: Rc<dyn Respondent>,
    },
    /// No answer right now; evaluation suspends with this context.
    Unavailable(Transcript),
}

/// Answers rendered messages.
pub trait Respondent {
    fn respond(&self, observation: &Observation) -> EvalResult<Turn>;
}

/// A decision function over a whole transcript.
///
/// Returns `None` when it cannot answer yet.
pub trait Policy {
    fn decide(&self, transcript: &Transcript) -> Option<Response>;
}

impl<F> Policy for F
where
    F: Fn(&Transcript) -> Option<Response>,
{
    fn decide(&self, transcript: &Transcript) -> Option<Response> {
        self(transcript)
    }
}

/// A respondent made from a stateless policy plus the transcript so far.
pub struct StatelessRespondent<P> {
    policy: Rc<P>,
    transcript: Transcript,
}

impl<P: Policy + 'static> StatelessRespondent<P> {
    pub fn new(policy: P) -> Self {
        Self::with_transcript(Rc::new(policy), Transcript::new())
    }

    /// Resume a policy partway through a conversation.
    pub fn with_transcript(policy: Rc<P>, transcript: Transcript) -> Self {
        Self { policy, transcript }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Box up as the shared snapshot the evaluator holds.
    pub fn into_shared(self) -> Rc<dyn Respondent> {
        Rc::new(self)
    }
}

impl<P: Policy + 'static> Respondent for StatelessRespondent<P> {
    fn respond(&self, observation: &Observation) -> EvalResult<Turn> {
        let seen = self.transcript.clone().observed(observation.clone());
        match self.policy.decide(&seen) {
            Some(response) => {
                let next =
                    Self::with_transcript(Rc::clone(&self.policy), seen.answered(response.clone()));
                Ok(Turn::Answered {
                    response,
                    next: Rc::new(next),
                })
            }
            None => Ok(Turn::Unavailable(seen)),
        }
    }
}

/// Wrap a closure as a shared respondent.
pub fn respondent<F>(policy: F) -> Rc<dyn Respondent>
where
    F: Fn(&Transcript) -> Option<Response> + 'static,
{
    StatelessRespondent::new(policy).into_shared()
}
