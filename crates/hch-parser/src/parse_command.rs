//! Command parsing: a verb, optional `ask` modifiers, and an argument.

use hch_lexer::token::TokenKind;
use hch_types::{AskOptions, Command, Message, ParseErrorKind, Pointer, Referent};

use crate::parser::{ParseResult, Parser};

impl Parser {
    /// Parse the whole token stream as one command.
    pub fn parse_command<C>(mut self) -> ParseResult<Command<C>> {
        let command = self.command();
        self.finish(command)
    }

    fn command<C>(&mut self) -> Option<Command<C>> {
        let TokenKind::Verb(verb) = self.peek_kind().clone() else {
            self.error_at_current(ParseErrorKind::MissingVerb);
            return None;
        };
        let verb_span = self.advance();

        let options = self.ask_options(&verb)?;

        match verb.as_str() {
            "reflect" => {
                if !self.at_end() {
                    self.error_at_current(ParseErrorKind::UnexpectedArgument { verb });
                    return None;
                }
                Some(Command::Reflect)
            }
            "reply" | "ask" | "note" | "view" => {
                let message = self.argument(&verb)?;
                Some(match verb.as_str() {
                    "reply" => Command::Reply(message),
                    "note" => Command::Note(message),
                    "view" => Command::View(message),
                    _ => Command::Ask { message, options },
                })
            }
            _ => {
                self.error_at(ParseErrorKind::UnknownVerb { verb }, verb_span);
                None
            }
        }
    }

    /// Collect `@N` and `$N` modifiers; only `ask` accepts them.
    fn ask_options(&mut self, verb: &str) -> Option<AskOptions> {
        let mut options = AskOptions::default();
        loop {
            let duplicate = match self.peek_kind().clone() {
                TokenKind::Recipient(index) => options
                    .recipient
                    .replace(Pointer::channel(index))
                    .map(|_| '@'),
                TokenKind::BudgetModifier(budget) => options.budget.replace(budget).map(|_| '$'),
                _ => break,
            };
            let span = self.advance();
            if verb != "ask" {
                self.error_at(
                    ParseErrorKind::ModifierNotAllowed {
                        verb: verb.to_string(),
                    },
                    span,
                );
                return None;
            }
            if let Some(modifier) = duplicate {
                self.error_at(ParseErrorKind::DuplicateModifier { modifier }, span);
                return None;
            }
        }
        Some(options)
    }

    /// The message after the head. One pair of parentheses around the whole
    /// argument only delimits it.
    fn argument<C>(&mut self, verb: &str) -> Option<Message<C>> {
        if self.at_end() {
            self.error_at_current(ParseErrorKind::MissingArgument {
                verb: verb.to_string(),
            });
            return None;
        }
        let message = self.message_body()?;
        if !self.at_end() {
            self.error_at_current(ParseErrorKind::UnmatchedParen);
            return None;
        }
        match message.into_reference() {
            Ok(Referent::Message(inner)) => Some(inner),
            Ok(other) => Some(Message::reference(other)),
            Err(message) => Some(message),
        }
    }
}
