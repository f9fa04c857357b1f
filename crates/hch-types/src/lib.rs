//! Shared types for HCH.
//!
//! This crate defines the referent algebra (messages, pointers, channels),
//! the command AST produced by the parser, source spans, and the error
//! types shared by every later stage.

mod error;
mod span;
pub mod command;
pub mod referent;

pub use command::{AskOptions, Command};
pub use error::{ParseError, ParseErrorKind, ParseErrors, ReferentError, MAX_ERRORS};
pub use referent::{Channel, Message, Pointer, Referent, ReferentKind, SLOT};
pub use span::Span;

/// The shrinking resource bounding recursive work: a step count, or
/// milliseconds when time accounting is in effect.
pub type Budget = u64;

/// Result type used by the referent algebra.
pub type Result<T> = std::result::Result<T, ReferentError>;
