//! Message parsing: text, nested `( … )` messages, and pointer references.

use hch_lexer::token::TokenKind;
use hch_types::{Message, ParseErrorKind, Referent};

use crate::parser::{ParseResult, Parser, MAX_NESTING};

impl Parser {
    /// Parse the whole token stream as one message.
    pub fn parse_message<C>(mut self) -> ParseResult<Message<C>> {
        let message = self.message_body();
        if message.is_some() && !self.at_end() {
            // Only a stray `)` can stop a top-level body early.
            self.error_at_current(ParseErrorKind::UnmatchedParen);
        }
        self.finish(message)
    }

    /// Parse message items up to a closing `)` or end of input, leaving the
    /// terminator unconsumed.
    pub(crate) fn message_body<C>(&mut self) -> Option<Message<C>> {
        let mut fragments = vec![String::new()];
        let mut args = Vec::new();

        loop {
            match self.peek_kind().clone() {
                TokenKind::Text(text) => {
                    self.advance();
                    if let Some(last) = fragments.last_mut() {
                        last.push_str(&text);
                    }
                }
                TokenKind::Reference(pointer) => {
                    self.advance();
                    args.push(Referent::Pointer(pointer));
                    fragments.push(String::new());
                }
                TokenKind::LParen => {
                    let nested = self.nested_message()?;
                    args.push(Referent::Message(nested));
                    fragments.push(String::new());
                }
                _ => break,
            }
        }

        Message::from_parts(fragments, args).ok()
    }

    /// Parse `( body )`.
    fn nested_message<C>(&mut self) -> Option<Message<C>> {
        let open = self.advance();
        if self.depth >= MAX_NESTING {
            self.error_at(ParseErrorKind::NestingTooDeep { limit: MAX_NESTING }, open);
            return None;
        }

        self.depth += 1;
        let inner = self.message_body();
        self.depth -= 1;
        let inner = inner?;

        if !self.eat(&TokenKind::RParen) {
            self.error_at(ParseErrorKind::UnclosedParen, open);
            return None;
        }
        Some(inner)
    }
}

#[cfg(test)]
mod tests {
    use crate::try_parse_message;
    use hch_types::{Message, ParseErrorKind, Pointer, Referent};

    #[test]
    fn test_nested_counts() {
        let m: Message<()> = try_parse_message("a (b (c) d) #2 e").unwrap();
        assert_eq!(m.size(), 2);
        assert_eq!(m.fragments(), ["a ", " ", " e"]);
        assert_eq!(m.args()[1], Referent::Pointer(Pointer::new(2)));
        let inner = m.args()[0].as_message().unwrap();
        assert_eq!(inner.size(), 1);
    }

    #[test]
    fn test_unclosed_paren_points_at_opener() {
        let errs = try_parse_message::<()>("x (y (z)").unwrap_err();
        assert_eq!(errs.errors[0].kind, ParseErrorKind::UnclosedParen);
        assert_eq!(errs.errors[0].span.start, 2);
    }

    #[test]
    fn test_stray_close_paren() {
        let errs = try_parse_message::<()>("x) y").unwrap_err();
        assert_eq!(errs.errors[0].kind, ParseErrorKind::UnmatchedParen);
    }
}
