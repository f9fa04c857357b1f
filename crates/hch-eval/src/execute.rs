//! Command execution against an evaluator node.

use crate::env::Env;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{Answer, Evaluator};
use hch_types::{AskOptions, Budget, Channel, Command, Message, Pointer, Referent};

/// Observation shown after a command that did not parse.
pub const HELP_TEXT: &str =
    "the valid commands are 'reply', 'ask', 'note', 'reflect', 'view', and 'ask@N'";

/// What a command produced and what it cost.
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    /// The conversation continues with `observation` as the next message.
    Intermediate {
        observation: Message<Env>,
        spending: Budget,
    },
    /// The conversation ends with `value`.
    Final {
        value: Message<Env>,
        spending: Budget,
    },
    /// The conversation waits while `recipient` answers `message` with
    /// `budget`. Spending is settled once the answer is back.
    Delegate {
        recipient: Env,
        message: Message<Env>,
        budget: Budget,
    },
}

impl Execution {
    /// Budget charged right away. Delegation is charged on return.
    pub fn spending(&self) -> Budget {
        match self {
            Self::Intermediate { spending, .. } | Self::Final { spending, .. } => *spending,
            Self::Delegate { .. } => 0,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final { .. })
    }
}

impl Evaluator {
    /// Run one command in `env` with `budget` available.
    ///
    /// Never recurses: `ask` comes back as [`Execution::Delegate`] and the
    /// evaluator's work stack carries it out.
    pub fn execute(
        &self,
        command: Command<Env>,
        env: &Env,
        budget: Budget,
    ) -> EvalResult<Execution> {
        let cost = self.config().command_cost;
        let execution = match command {
            Command::Malformed => Execution::Intermediate {
                observation: Message::text(HELP_TEXT),
                spending: cost,
            },
            Command::Reflect => Execution::Intermediate {
                observation: Message::from_template(
                    "you are []",
                    vec![Referent::Channel(Channel::new(env.clone()))],
                )?,
                spending: cost,
            },
            Command::View(message) => Execution::Intermediate {
                observation: view(&message, env)?,
                spending: cost,
            },
            Command::Note(message) => Execution::Intermediate {
                observation: message,
                spending: cost,
            },
            Command::Reply(message) => Execution::Final {
                value: message.instantiate(env.args())?,
                spending: cost,
            },
            Command::Ask { message, options } => self.ask(message, options, env, budget)?,
        };
        Ok(execution)
    }

    fn ask(
        &self,
        message: Message<Env>,
        options: AskOptions,
        env: &Env,
        budget: Budget,
    ) -> EvalResult<Execution> {
        let recipient = match options.recipient {
            Some(pointer) => recipient(pointer, env)?,
            None => env.child(),
        };

        let requested = options
            .budget
            .unwrap_or(budget / self.config().default_fraction);
        let sub_budget = requested.min(budget.saturating_sub(1));

        let outgoing = Message::with_sender(env.clone(), message.instantiate(env.args())?);
        Ok(Execution::Delegate {
            recipient,
            message: outgoing,
            budget: sub_budget,
        })
    }

    /// Turn a sub-conversation's answer into the asker's observation.
    ///
    /// Only what the sub-conversation used is charged, plus the surcharge.
    pub fn settle(&self, granted: Budget, answer: Answer) -> EvalResult<Execution> {
        let used = granted
            .checked_sub(answer.remaining)
            .ok_or(EvalError::BudgetInvariant {
                budget: granted,
                spending: answer.remaining,
            })?;
        Ok(Execution::Intermediate {
            observation: Message::with_sender(answer.env, answer.value),
            spending: used + self.config().ask_surcharge,
        })
    }
}

/// A bare reference to a message shows that message; anything else is
/// resolved against the scope.
fn view(message: &Message<Env>, env: &Env) -> EvalResult<Message<Env>> {
    if let Some(Referent::Pointer(pointer)) = message.as_reference() {
        if let Referent::Message(target) = pointer.instantiate(env.args())? {
            return Ok(target);
        }
    }
    Ok(message.instantiate(env.args())?)
}

fn recipient(pointer: Pointer, env: &Env) -> EvalResult<Env> {
    match pointer.instantiate(env.args())? {
        Referent::Channel(channel) => Ok(channel.into_handle()),
        other => Err(EvalError::RecipientTypeMismatch {
            index: pointer.index,
            found: other.describe(),
        }),
    }
}
