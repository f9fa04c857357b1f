//! The referent algebra: messages with argument slots, pointers into an
//! argument scope, and channels to concrete recipients.
//!
//! A [`Message`] is literal text interleaved with argument slots. Every slot
//! holds a [`Referent`]. Messages are immutable values; every operation
//! returns a new message.
//!
//! The algebra is generic over the channel handle `C`. The parser never
//! produces channels, so it works for any `C`; the evaluator fixes `C` to
//! its own node handle.

use crate::{ReferentError, Result};
use std::fmt;

/// Slot marker used by [`Message::from_template`].
pub const SLOT: &str = "[]";

/// What a pointer expects to find at its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReferentKind {
    #[default]
    Message,
    Channel,
    Any,
}

impl ReferentKind {
    /// Display symbol: `#` for messages, `@` for channels, `?` for anything.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Message => "#",
            Self::Channel => "@",
            Self::Any => "?",
        }
    }
}

impl fmt::Display for ReferentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message => write!(f, "message"),
            Self::Channel => write!(f, "channel"),
            Self::Any => write!(f, "referent"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Referent
// ─────────────────────────────────────────────────────────────────────

/// Anything that can be cited inside a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Referent<C> {
    Message(Message<C>),
    Pointer(Pointer),
    Channel(Channel<C>),
}

impl<C> Referent<C> {
    /// Symbol used when this referent occupies a rendered slot.
    pub fn symbol(&self) -> String {
        match self {
            Self::Message(_) => ReferentKind::Message.symbol().to_string(),
            Self::Channel(_) => ReferentKind::Channel.symbol().to_string(),
            Self::Pointer(p) => p.symbol(),
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Pointer(_) => "pointer",
            Self::Channel(_) => "channel",
        }
    }

    pub fn as_message(&self) -> Option<&Message<C>> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel<C>> {
        match self {
            Self::Channel(c) => Some(c),
            _ => None,
        }
    }

    /// `true` if no pointer occurs anywhere inside this referent.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Message(m) => m.is_closed(),
            Self::Pointer(_) => false,
            Self::Channel(_) => true,
        }
    }

    fn write_source(&self, out: &mut String) {
        match self {
            Self::Message(m) => {
                out.push('(');
                m.write_source(out);
                out.push(')');
            }
            Self::Pointer(p) => out.push_str(&p.to_string()),
            Self::Channel(_) => out.push_str(ReferentKind::Channel.symbol()),
        }
    }
}

impl<C: Clone> Referent<C> {
    /// Substitute pointers against `scope`.
    ///
    /// Messages substitute their arguments recursively, pointers resolve to
    /// the scope entry they name, and channels always fail.
    pub fn instantiate(&self, scope: &[Referent<C>]) -> Result<Referent<C>> {
        match self {
            Self::Message(m) => m.instantiate(scope).map(Self::Message),
            Self::Pointer(p) => p.instantiate(scope),
            Self::Channel(c) => c.instantiate(),
        }
    }
}

impl<C> fmt::Display for Referent<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(m) => write!(f, "{m}"),
            Self::Pointer(p) => write!(f, "{p}"),
            Self::Channel(c) => write!(f, "{c}"),
        }
    }
}

impl<C> From<Message<C>> for Referent<C> {
    fn from(message: Message<C>) -> Self {
        Self::Message(message)
    }
}

impl<C> From<Pointer> for Referent<C> {
    fn from(pointer: Pointer) -> Self {
        Self::Pointer(pointer)
    }
}

impl<C> From<Channel<C>> for Referent<C> {
    fn from(channel: Channel<C>) -> Self {
        Self::Channel(channel)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Pointer
// ─────────────────────────────────────────────────────────────────────

/// An index into the scope a message is instantiated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pointer {
    pub index: usize,
    pub kind: ReferentKind,
}

impl Pointer {
    /// A pointer expecting a message.
    pub fn new(index: usize) -> Self {
        Self::with_kind(index, ReferentKind::Message)
    }

    pub fn with_kind(index: usize, kind: ReferentKind) -> Self {
        Self { index, kind }
    }

    /// A pointer expecting a channel, as used for explicit recipients.
    pub fn channel(index: usize) -> Self {
        Self::with_kind(index, ReferentKind::Channel)
    }

    /// The kind symbol followed by an arrow, e.g. `#->`.
    pub fn symbol(&self) -> String {
        format!("{}->", self.kind.symbol())
    }

    /// Look up `scope[index]`.
    pub fn instantiate<C: Clone>(&self, scope: &[Referent<C>]) -> Result<Referent<C>> {
        scope
            .get(self.index)
            .cloned()
            .ok_or(ReferentError::OutOfRange {
                index: self.index,
                len: scope.len(),
            })
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.symbol(), self.index)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Channel
// ─────────────────────────────────────────────────────────────────────

/// A citable handle on a concrete recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel<C> {
    handle: C,
}

impl<C> Channel<C> {
    pub fn new(handle: C) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &C {
        &self.handle
    }

    pub fn into_handle(self) -> C {
        self.handle
    }

    /// Channels are bindings, not templates, so this always fails.
    pub fn instantiate<T>(&self) -> Result<T> {
        Err(ReferentError::ChannelInstantiation)
    }
}

impl<C> fmt::Display for Channel<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(ReferentKind::Channel.symbol())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Message
// ─────────────────────────────────────────────────────────────────────

/// Literal text fragments interleaved with argument slots.
///
/// Invariant: `fragments.len() == args.len() + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Message<C> {
    fragments: Vec<String>,
    args: Vec<Referent<C>>,
}

impl<C> Message<C> {
    /// A message with no slots.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            fragments: vec![text.into()],
            args: Vec::new(),
        }
    }

    /// Build from explicit fragments and arguments.
    pub fn from_parts(fragments: Vec<String>, args: Vec<Referent<C>>) -> Result<Self> {
        if fragments.len() != args.len() + 1 {
            return Err(ReferentError::SlotMismatch {
                fragments: fragments.len(),
                args: args.len(),
            });
        }
        Ok(Self { fragments, args })
    }

    /// Build from a template whose slots are marked with `[]`.
    ///
    /// ```
    /// use hch_types::{Message, Pointer};
    ///
    /// let m: Message<()> = Message::from_template("[] plus []", vec![
    ///     Pointer::new(0).into(),
    ///     Pointer::new(1).into(),
    /// ]).unwrap();
    /// assert_eq!(m.render_from(4), "#->4 plus #->5");
    /// ```
    pub fn from_template(template: &str, args: Vec<Referent<C>>) -> Result<Self> {
        let fragments = template.split(SLOT).map(str::to_string).collect();
        Self::from_parts(fragments, args)
    }

    /// A message that is nothing but one slot.
    pub fn reference(referent: Referent<C>) -> Self {
        Self {
            fragments: vec![String::new(), String::new()],
            args: vec![referent],
        }
    }

    /// `"[]: "` followed by `message`, where the slot is a channel to `sender`.
    pub fn with_sender(sender: C, message: Message<C>) -> Self {
        let tag = Self {
            fragments: vec![String::new(), ": ".to_string()],
            args: vec![Referent::Channel(Channel::new(sender))],
        };
        tag.concat(message)
    }

    /// Number of argument slots.
    pub fn size(&self) -> usize {
        self.args.len()
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn args(&self) -> &[Referent<C>] {
        &self.args
    }

    pub fn into_args(self) -> Vec<Referent<C>> {
        self.args
    }

    /// Join two messages, splicing the last fragment of `self` onto the
    /// first fragment of `other`.
    pub fn concat(mut self, other: Message<C>) -> Message<C> {
        let mut rest = other.fragments.into_iter();
        let head = rest.next().unwrap_or_default();
        match self.fragments.last_mut() {
            Some(last) => last.push_str(&head),
            None => self.fragments.push(head),
        }
        self.fragments.extend(rest);
        self.args.extend(other.args);
        self
    }

    /// Interleave the fragments with one display name per slot.
    pub fn render<S: AsRef<str>>(&self, names: &[S]) -> String {
        debug_assert_eq!(names.len(), self.args.len());
        let mut out = String::new();
        for (fragment, name) in self.fragments.iter().zip(names) {
            out.push_str(fragment);
            out.push_str(name.as_ref());
        }
        if let Some(last) = self.fragments.last() {
            out.push_str(last);
        }
        out
    }

    /// Render with slots numbered `start..start + size()`.
    pub fn render_from(&self, start: usize) -> String {
        let names: Vec<String> = self
            .args
            .iter()
            .enumerate()
            .map(|(i, arg)| format!("{}{}", arg.symbol(), start + i))
            .collect();
        self.render(&names)
    }

    /// The sole argument of a message that is nothing but one slot.
    pub fn as_reference(&self) -> Option<&Referent<C>> {
        match (self.fragments.as_slice(), self.args.as_slice()) {
            ([before, after], [arg]) if before.is_empty() && after.is_empty() => Some(arg),
            _ => None,
        }
    }

    /// Unwrap a bare single-slot message into its referent.
    pub fn into_reference(mut self) -> std::result::Result<Referent<C>, Self> {
        if self.as_reference().is_some() {
            if let Some(arg) = self.args.pop() {
                return Ok(arg);
            }
        }
        Err(self)
    }

    /// `true` if no pointer occurs anywhere inside this message.
    pub fn is_closed(&self) -> bool {
        self.args.iter().all(Referent::is_closed)
    }

    /// Escaped, fully nested source text that parses back to this message.
    ///
    /// Channels cannot be written in source and show as a bare `@`.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        for (i, fragment) in self.fragments.iter().enumerate() {
            // Digits right after a pointer would extend its index.
            let after_pointer = i > 0 && matches!(self.args[i - 1], Referent::Pointer(_));
            if after_pointer && fragment.starts_with(|c: char| c.is_ascii_digit()) {
                out.push('\\');
            }
            escape_into(fragment, out);
            if let Some(arg) = self.args.get(i) {
                arg.write_source(out);
            }
        }
    }
}

impl<C: Clone> Message<C> {
    /// Substitute every argument against `scope`, leaving the text alone.
    pub fn instantiate(&self, scope: &[Referent<C>]) -> Result<Message<C>> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.instantiate(scope))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            fragments: self.fragments.clone(),
            args,
        })
    }
}

/// Canonical nested form: every argument parenthesized and rendered in turn.
impl<C> fmt::Display for Message<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.args.iter().map(|arg| format!("({arg})")).collect();
        f.write_str(&self.render(&names))
    }
}

/// Characters with meaning in message source.
const SPECIAL: &[char] = &['(', ')', '#', '@', '?', '\\'];

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        if SPECIAL.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
}
