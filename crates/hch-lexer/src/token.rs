//! Token types for the HCH lexer.
//!
//! Defines [`TokenKind`] covering message bodies and command heads, and
//! [`Token`], which pairs a kind with a source [`Span`].

use hch_types::{Budget, Pointer, Span};
use std::fmt;

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the HCH lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location.
    pub span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in HCH text.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Command head ─────────────────────────────────────────

    /// Leading command word: `reply`, `ask`, ...
    Verb(String),
    /// `@N` directly after the verb.
    Recipient(usize),
    /// `$N` directly after the verb.
    BudgetModifier(Budget),

    // ── Message body ─────────────────────────────────────────

    /// Literal text, escapes already resolved.
    Text(String),
    /// `#N`, `@N`, `#->N`, `@->N`, `?->N`
    Reference(Pointer),
    /// `(`
    LParen,
    /// `)`
    RParen,

    /// End of input.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verb(v) => write!(f, "{v}"),
            Self::Recipient(n) => write!(f, "@{n}"),
            Self::BudgetModifier(n) => write!(f, "${n}"),
            Self::Text(t) => write!(f, "{t}"),
            Self::Reference(p) => write!(f, "{p}"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}
