//! The budgeted evaluator.
//!
//! Each call to [`Evaluator::act`] drives one conversation: render the
//! incoming message, take the respondent's turn, execute the command,
//! and repeat with the command's observation until something is final.
//!
//! Nested asks do not recurse on the native stack. A conversation that
//! delegates is parked on an explicit work stack and resumed when its
//! sub-conversation answers, so the depth ceiling is the only limit on
//! nesting.

use crate::config::{Accounting, EvalConfig};
use crate::env::Env;
use crate::error::{EvalError, EvalResult};
use crate::execute::Execution;
use crate::respondent::{Observation, Respondent, Turn};
use crate::Flow;
use hch_parser::{parse_command, parse_message};
use hch_types::{Budget, Message};
use std::rc::Rc;

/// A finished conversation: its final message, the node that produced
/// it, and the budget left over.
#[derive(Debug, Clone)]
pub struct Answer {
    pub value: Message<Env>,
    pub env: Env,
    pub remaining: Budget,
}

/// A conversation in progress.
struct Frame {
    env: Env,
    message: Message<Env>,
    budget: Budget,
    depth: usize,
    turns: usize,
}

/// A conversation parked while a sub-conversation answers it.
struct Waiting {
    env: Env,
    budget: Budget,
    depth: usize,
    turns: usize,
    granted: Budget,
}

enum Next {
    Continue(Frame),
    Delegate { caller: Waiting, child: Frame },
    Answered(Answer),
}

/// Evaluates messages under a budget.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvalConfig,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Self {
        Self { config }
    }

    /// Like [`Evaluator::new`] but rejects out-of-range settings.
    pub fn try_new(config: EvalConfig) -> EvalResult<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Parse `root` and evaluate it against a fresh tree of `respondent`.
    ///
    /// Returns the final message in its nested display form.
    pub fn run(
        &self,
        root: &str,
        budget: Budget,
        respondent: Rc<dyn Respondent>,
    ) -> EvalResult<Flow<String>> {
        self.config.validate()?;
        let message = parse_message(root);
        let env = Env::root(respondent);
        let answer = ready!(self.act(env, message, budget, 0));
        tracing::debug!(remaining = answer.remaining, "evaluation finished");
        Ok(Flow::Ready(answer.value.to_string()))
    }

    /// Show `message` to the node `env` and carry the conversation to its end.
    #[tracing::instrument(skip(self, env, message), level = "debug")]
    pub fn act(
        &self,
        env: Env,
        message: Message<Env>,
        budget: Budget,
        depth: usize,
    ) -> EvalResult<Flow<Answer>> {
        self.check_depth(depth)?;
        let mut waiting: Vec<Waiting> = Vec::new();
        let mut next = Next::Continue(Frame {
            env,
            message,
            budget,
            depth,
            turns: 0,
        });
        loop {
            next = match next {
                Next::Continue(frame) => ready!(self.turn(frame)),
                Next::Delegate { caller, child } => {
                    self.check_depth(child.depth)?;
                    tracing::debug!(depth = child.depth, budget = child.budget, "asking");
                    waiting.push(caller);
                    Next::Continue(child)
                }
                Next::Answered(answer) => match waiting.pop() {
                    None => return Ok(Flow::Ready(answer)),
                    Some(caller) => {
                        let execution = self.settle(caller.granted, answer)?;
                        let Waiting {
                            env, budget, depth, turns, ..
                        } = caller;
                        self.advance(env, execution, budget, depth, turns)?
                    }
                },
            };
        }
    }

    /// One respondent turn of `frame`'s conversation.
    fn turn(&self, frame: Frame) -> EvalResult<Flow<Next>> {
        let Frame {
            env,
            message,
            mut budget,
            depth,
            turns,
        } = frame;
        if turns >= self.config.max_turns {
            return Err(EvalError::TurnLimit {
                turns,
                limit: self.config.max_turns,
            });
        }

        let observation = Observation {
            text: self.render(&env, &message, budget),
            budget,
        };
        tracing::trace!(text = %observation.text, "rendered");

        let (response, next) = match env.respondent().respond(&observation)? {
            Turn::Answered { response, next } => (response, next),
            Turn::Unavailable(transcript) => {
                tracing::debug!(depth, "respondent unavailable, suspending");
                return Ok(Flow::Suspended(transcript));
            }
        };
        let successor = env.successor(&message, next);

        if self.config.accounting == Accounting::Time {
            budget = budget.saturating_sub(response.elapsed);
        }
        if budget == 0 {
            tracing::debug!(depth, "budget exhausted, returning response as-is");
            return Ok(Flow::Ready(Next::Answered(Answer {
                value: parse_message(&response.text),
                env: successor,
                remaining: 0,
            })));
        }

        let command = parse_command(&response.text);
        let verb = command.verb();
        let execution = self.execute(command, &successor, budget)?;
        tracing::debug!(depth, verb, spending = execution.spending(), budget, "turn");
        Ok(Flow::Ready(self.advance(successor, execution, budget, depth, turns + 1)?))
    }

    /// Charge `execution` and decide where the conversation goes next.
    fn advance(
        &self,
        env: Env,
        execution: Execution,
        budget: Budget,
        depth: usize,
        turns: usize,
    ) -> EvalResult<Next> {
        let spending = execution.spending();
        let budget = budget
            .checked_sub(spending)
            .ok_or(EvalError::BudgetInvariant { budget, spending })?;
        Ok(match execution {
            Execution::Final { value, .. } => Next::Answered(Answer {
                value,
                env,
                remaining: budget,
            }),
            Execution::Intermediate { observation, .. } => Next::Continue(Frame {
                env,
                message: observation,
                budget,
                depth,
                turns,
            }),
            Execution::Delegate {
                recipient,
                message,
                budget: granted,
            } => Next::Delegate {
                caller: Waiting {
                    env,
                    budget,
                    depth,
                    turns,
                    granted,
                },
                child: Frame {
                    env: recipient,
                    message,
                    budget: granted,
                    depth: depth + 1,
                    turns: 0,
                },
            },
        })
    }

    fn check_depth(&self, depth: usize) -> EvalResult<()> {
        if depth > self.config.max_depth {
            return Err(EvalError::DepthLimit {
                depth,
                limit: self.config.max_depth,
            });
        }
        Ok(())
    }

    /// Number `message`'s slots after the node's scope and append the
    /// budget notice.
    pub fn render(&self, env: &Env, message: &Message<Env>, budget: Budget) -> String {
        let mut text = message.render_from(env.args().len());
        if self.config.accounting == Accounting::Steps {
            text.push_str(&budget_notice(budget));
        }
        text
    }
}

fn budget_notice(budget: Budget) -> String {
    if budget == 0 {
        "\n[You have no budget, your next message is returned as-is]".to_string()
    } else {
        format!("\n[Remaining budget is {budget}]")
    }
}
