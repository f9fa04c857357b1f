//! Core HCH lexer: converts respondent text to a token stream.
//!
//! Two entry modes:
//! - message mode lexes the whole input as a message body
//! - command mode first lexes a verb and its `@N` / `$N` modifiers, then
//!   switches to message mode for the argument
//!
//! Errors are collected rather than stopping at the first.

use hch_types::{ParseError, ParseErrorKind, ParseErrors, Pointer, ReferentKind, Span};

use crate::token::{Token, TokenKind};

/// Whether we are scanning a command head or message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Verb and modifiers at the start of a command.
    Head,
    /// Message text.
    Body,
}

/// The HCH lexer.
pub struct Lexer<'src> {
    /// The full source text.
    source: &'src str,
    /// Current byte offset into `source`.
    pos: usize,
    mode: Mode,
    /// Collected errors.
    errors: ParseErrors,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: ParseErrors,
}

impl<'src> Lexer<'src> {
    /// Lex `source` as message text.
    pub fn message(source: &'src str) -> Self {
        Self::with_mode(source, Mode::Body)
    }

    /// Lex `source` as a command: head first, then message text.
    pub fn command(source: &'src str) -> Self {
        Self::with_mode(source, Mode::Head)
    }

    fn with_mode(source: &'src str, mode: Mode) -> Self {
        Self {
            source,
            pos: 0,
            mode,
            errors: ParseErrors::empty(),
        }
    }

    /// Lex the entire input into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();

        if self.mode == Mode::Head {
            self.scan_head(&mut tokens);
            self.mode = Mode::Body;
        }

        while !self.at_end() {
            if self.errors.total_errors >= hch_types::MAX_ERRORS {
                break;
            }
            tokens.push(self.scan_body());
        }

        tokens.push(Token::new(TokenKind::Eof, Span::point(self.pos)));

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn rest(&self) -> &'src str {
        let source = self.source;
        &source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn emit_error(&mut self, kind: ParseErrorKind, span: Span) {
        self.errors.push(ParseError::new(kind, span));
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
        self.pos > start
    }

    /// Consume a run of ASCII digits. `None` if there are none.
    fn scan_digits(&mut self) -> Option<&'src str> {
        let source = self.source;
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        (self.pos > start).then(|| &source[start..self.pos])
    }

    fn parse_number<T: std::str::FromStr>(&mut self, digits: &str, start: usize) -> Option<T> {
        match digits.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                self.emit_error(ParseErrorKind::NumberTooLarge, Span::new(start, self.pos));
                None
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Command head
    // ─────────────────────────────────────────────────────────────

    /// Scan `verb`, then any `@N` / `$N` modifiers, then the separator.
    fn scan_head(&mut self, tokens: &mut Vec<Token>) {
        self.skip_whitespace();

        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.advance();
        }
        if self.pos == start {
            // No verb; the parser reports it.
            return;
        }
        let verb = self.source[start..self.pos].to_ascii_lowercase();
        tokens.push(Token::new(TokenKind::Verb(verb), Span::new(start, self.pos)));

        loop {
            let start = self.pos;
            let marker = match self.peek() {
                Some(c @ ('@' | '$')) if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => c,
                _ => break,
            };
            self.advance();
            let Some(digits) = self.scan_digits() else {
                break;
            };
            let span = Span::new(start, self.pos);
            let kind = if marker == '@' {
                self.parse_number(digits, start).map(TokenKind::Recipient)
            } else {
                self.parse_number(digits, start).map(TokenKind::BudgetModifier)
            };
            if let Some(kind) = kind {
                tokens.push(Token::new(kind, span));
            }
        }

        if self.skip_whitespace() || self.at_end() || self.peek() == Some('(') {
            return;
        }
        if let Some(found) = self.peek() {
            let start = self.pos;
            self.advance();
            self.emit_error(
                ParseErrorKind::UnexpectedCharacter { found },
                Span::new(start, self.pos),
            );
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Message body
    // ─────────────────────────────────────────────────────────────

    /// Scan one token of message text.
    fn scan_body(&mut self) -> Token {
        let start = self.pos;

        match self.peek() {
            Some('(') => {
                self.advance();
                return Token::new(TokenKind::LParen, Span::new(start, self.pos));
            }
            Some(')') => {
                self.advance();
                return Token::new(TokenKind::RParen, Span::new(start, self.pos));
            }
            _ => {}
        }

        if let Some(pointer) = self.scan_reference() {
            return Token::new(TokenKind::Reference(pointer), Span::new(start, self.pos));
        }

        let mut text = String::new();
        while let Some(ch) = self.peek() {
            match ch {
                '(' | ')' => break,
                '#' | '@' | '?' if !text.is_empty() && self.reference_ahead() => break,
                '\\' => {
                    self.advance();
                    match self.peek() {
                        Some(next) if is_escapable(next) => {
                            self.advance();
                            text.push(next);
                        }
                        _ => text.push('\\'),
                    }
                }
                _ => {
                    self.advance();
                    text.push(ch);
                }
            }
        }

        Token::new(TokenKind::Text(text), Span::new(start, self.pos))
    }

    /// Whether a reference starts at the cursor, without consuming it.
    fn reference_ahead(&self) -> bool {
        let mut probe = Lexer::message(self.source);
        probe.pos = self.pos;
        probe.scan_reference().is_some() || probe.errors.has_errors()
    }

    /// Scan `#N`, `#->N`, `@N`, `@->N` or `?->N`. Leaves the cursor alone
    /// and returns `None` if the sigil is not followed by a reference.
    fn scan_reference(&mut self) -> Option<Pointer> {
        let start = self.pos;
        let kind = match self.peek()? {
            '#' => ReferentKind::Message,
            '@' => ReferentKind::Channel,
            '?' => ReferentKind::Any,
            _ => return None,
        };
        self.advance();

        let arrow = self.peek() == Some('-') && self.peek_at(1) == Some('>');
        if arrow {
            self.advance();
            self.advance();
        } else if kind == ReferentKind::Any {
            self.pos = start;
            return None;
        }

        let Some(digits) = self.scan_digits() else {
            self.pos = start;
            return None;
        };
        match self.parse_number(digits, start) {
            Some(index) => Some(Pointer::with_kind(index, kind)),
            None => {
                self.pos = start;
                None
            }
        }
    }
}

/// Characters a backslash turns into literal text.
fn is_escapable(ch: char) -> bool {
    matches!(ch, '(' | ')' | '#' | '@' | '?' | '\\') || ch.is_ascii_digit()
}
