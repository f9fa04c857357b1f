//! HCH parser: converts respondent text into messages and commands.
//!
//! The public entry points never fail. Text that does not parse becomes
//! the [`MALFORMED_MESSAGE`] sentinel or [`Command::Malformed`], so a
//! respondent's typo is shown back to them instead of aborting evaluation.
//! The `try_` variants expose the collected errors.

mod parse_command;
mod parse_message;
mod parser;

pub use parser::{ParseResult, Parser, MAX_NESTING};

use hch_lexer::Lexer;
use hch_types::{Command, Message, ParseErrors};

/// Text of the message substituted for unparseable message text.
pub const MALFORMED_MESSAGE: &str = "<<malformed message>>";

/// Parse message text, collecting errors.
pub fn try_parse_message<C>(text: &str) -> Result<Message<C>, ParseErrors> {
    let lex = Lexer::message(text).lex();
    Parser::new(lex.tokens, lex.errors).parse_message().into_result()
}

/// Parse a command, collecting errors. Surrounding whitespace is ignored.
pub fn try_parse_command<C>(text: &str) -> Result<Command<C>, ParseErrors> {
    let lex = Lexer::command(text.trim()).lex();
    Parser::new(lex.tokens, lex.errors).parse_command().into_result()
}

/// Parse message text, falling back to the malformed-message sentinel.
pub fn parse_message<C>(text: &str) -> Message<C> {
    try_parse_message(text).unwrap_or_else(|errors| {
        tracing::debug!(%errors, "malformed message");
        Message::text(MALFORMED_MESSAGE)
    })
}

/// Parse a command, falling back to [`Command::Malformed`].
pub fn parse_command<C>(text: &str) -> Command<C> {
    try_parse_command(text).unwrap_or_else(|errors| {
        tracing::debug!(%errors, "malformed command");
        Command::Malformed
    })
}
