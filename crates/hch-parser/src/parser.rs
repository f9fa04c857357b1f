//! Core parser infrastructure: token cursor, error reporting, helpers.

use hch_lexer::token::{Token, TokenKind};
use hch_types::{ParseError, ParseErrorKind, ParseErrors, Span};

/// Deepest parenthesis nesting accepted in one message.
pub const MAX_NESTING: usize = 64;

/// The HCH parser.
///
/// Consumes a token stream produced by the lexer and builds a message or
/// command. Errors from the lexer carry over; any error makes the parse fail.
pub struct Parser {
    /// The token stream.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Collected errors.
    errors: ParseErrors,
    /// Current parenthesis nesting depth.
    pub(crate) depth: usize,
}

/// Result of parsing.
pub struct ParseResult<T> {
    pub value: Option<T>,
    pub errors: ParseErrors,
}

impl<T> ParseResult<T> {
    /// The value if parsing produced one without any error.
    pub fn into_result(self) -> Result<T, ParseErrors> {
        match self.value {
            Some(value) if !self.errors.has_errors() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

impl Parser {
    /// Create a new parser from a token stream and the lexer's errors.
    pub fn new(tokens: Vec<Token>, lex_errors: ParseErrors) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: lex_errors,
            depth: 0,
        }
    }

    /// Wrap up a parse.
    pub(crate) fn finish<T>(self, value: Option<T>) -> ParseResult<T> {
        ParseResult {
            value,
            errors: self.errors,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or(self.tokens.last())
            .map(|t| t.span)
            .unwrap_or_default()
    }

    /// Advance the cursor by one and return the consumed token's span.
    pub(crate) fn advance(&mut self) -> Span {
        let span = self.current_span();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at(&mut self, kind: ParseErrorKind, span: Span) {
        self.errors.push(ParseError::new(kind, span));
    }

    pub(crate) fn error_at_current(&mut self, kind: ParseErrorKind) {
        let span = self.current_span();
        self.error_at(kind, span);
    }
}
