use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum number of parse errors stored before the rest are only counted.
pub const MAX_ERRORS: usize = 20;

/// Failures of the referent algebra.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferentError {
    /// A pointer names a slot past the end of the scope it is resolved in.
    #[error("pointer index {index} is out of range for a scope of {len} referents")]
    OutOfRange { index: usize, len: usize },

    /// Channels denote a concrete recipient and cannot be re-parameterized.
    #[error("a channel cannot be instantiated")]
    ChannelInstantiation,

    /// A message needs exactly one more text fragment than arguments.
    #[error("message has {fragments} fragments for {args} arguments")]
    SlotMismatch { fragments: usize, args: usize },
}

/// What went wrong while lexing or parsing respondent text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseErrorKind {
    UnexpectedCharacter { found: char },
    UnclosedParen,
    UnmatchedParen,
    NestingTooDeep { limit: usize },
    NumberTooLarge,
    UnknownVerb { verb: String },
    MissingVerb,
    MissingArgument { verb: String },
    UnexpectedArgument { verb: String },
    ModifierNotAllowed { verb: String },
    DuplicateModifier { modifier: char },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter { found } => write!(f, "unexpected character '{found}'"),
            Self::UnclosedParen => write!(f, "unclosed '('"),
            Self::UnmatchedParen => write!(f, "unmatched ')'"),
            Self::NestingTooDeep { limit } => {
                write!(f, "messages nest deeper than {limit} levels")
            }
            Self::NumberTooLarge => write!(f, "number is too large"),
            Self::UnknownVerb { verb } => write!(f, "unknown command '{verb}'"),
            Self::MissingVerb => write!(f, "expected a command"),
            Self::MissingArgument { verb } => write!(f, "'{verb}' needs a message"),
            Self::UnexpectedArgument { verb } => write!(f, "'{verb}' takes no message"),
            Self::ModifierNotAllowed { verb } => write!(f, "'{verb}' takes no modifiers"),
            Self::DuplicateModifier { modifier } => {
                write!(f, "modifier '{modifier}' given more than once")
            }
        }
    }
}

/// A located parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{span}: {kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Errors collected over one lex/parse pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseErrors {
    pub errors: Vec<ParseError>,
    pub total_errors: usize,
}

impl ParseErrors {
    /// Create an empty collection.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push(&mut self, error: ParseError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Append every error from `other`.
    pub fn extend(&mut self, other: ParseErrors) {
        let unstored = other.total_errors - other.errors.len();
        for error in other.errors {
            self.push(error);
        }
        self.total_errors += unstored;
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", shown.join("; "))?;
        if self.total_errors > self.errors.len() {
            write!(f, " (+{} more)", self.total_errors - self.errors.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}
