//! Commands a respondent can issue, one per turn.

use crate::{Budget, Message, Pointer};
use std::fmt;

/// Modifiers accepted by `ask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AskOptions {
    /// Explicit sub-budget (`ask$N`); the default fraction applies otherwise.
    pub budget: Option<Budget>,
    /// Explicit recipient (`ask@N`); a fresh child is asked otherwise.
    pub recipient: Option<Pointer>,
}

/// One parsed respondent action.
#[derive(Debug, Clone, PartialEq)]
pub enum Command<C> {
    /// Text that did not parse as any command.
    Malformed,
    /// Learn a channel to the current conversation.
    Reflect,
    /// Resolve a message against the current scope and look at it.
    View(Message<C>),
    /// Record a literal annotation.
    Note(Message<C>),
    /// Answer, ending this conversation.
    Reply(Message<C>),
    /// Delegate a question to a sub-conversation.
    Ask {
        message: Message<C>,
        options: AskOptions,
    },
}

impl<C> Command<C> {
    /// The verb this command is written with.
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Reflect => "reflect",
            Self::View(_) => "view",
            Self::Note(_) => "note",
            Self::Reply(_) => "reply",
            Self::Ask { .. } => "ask",
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed)
    }
}

impl<C> fmt::Display for Command<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed | Self::Reflect => f.write_str(self.verb()),
            Self::View(m) | Self::Note(m) | Self::Reply(m) => write!(f, "{} {m}", self.verb()),
            Self::Ask { message, options } => {
                f.write_str("ask")?;
                if let Some(recipient) = options.recipient {
                    write!(f, "@{}", recipient.index)?;
                }
                if let Some(budget) = options.budget {
                    write!(f, "${budget}")?;
                }
                write!(f, " {message}")
            }
        }
    }
}
