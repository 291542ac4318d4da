//! Output buffer and symbol dispatch
//!
//! `dispatch` is the single path from a symbol to a buffer mutation, used
//! both for detector output and for manual (virtual key) input so that both
//! produce identical buffer semantics.
//!
//! | Symbol      | Buffer effect            | Feedback                 |
//! |-------------|--------------------------|--------------------------|
//! | Letter X    | append X                 | `✍️ Typed: X`            |
//! | SPACE       | append " "               | `␣ Space added`          |
//! | DELETE      | pop last char (if any)   | deleted / nothing to del |
//! | ENTER       | none, sink commits text  | `↵ Execute command`      |
//! | other       | none, forwarded to sink  | sink's text / unhandled  |

use crate::symbol::GestureSymbol;
use serde::{Deserialize, Serialize};

/// Typed text owned by one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputBuffer {
    text: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_char(&mut self, c: char) {
        self.text.push(c);
    }

    pub fn push_space(&mut self) {
        self.text.push(' ');
    }

    /// Remove and return the last character; `None` on an empty buffer
    pub fn delete_last(&mut self) -> Option<char> {
        self.text.pop()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<&str> for OutputBuffer {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// What a dispatch (or session operation) did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Typed,
    Space,
    Deleted,
    NothingToDelete,
    Commit,
    Command,
    Unhandled,
    /// Session-level notice (sector switch, simulation toggle, care request)
    Notice,
}

/// Human-readable result of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub kind: FeedbackKind,
    pub text: String,
}

impl FeedbackMessage {
    pub fn new(kind: FeedbackKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::new(FeedbackKind::Notice, text)
    }
}

/// Receiver for everything `dispatch` does not handle itself
pub trait ActionSink {
    /// ENTER: commit the current buffer contents
    fn commit(&mut self, text: &str);

    /// Control symbol other than the typing primitives
    ///
    /// Returns feedback text if the sink acted on the command.
    fn command(&mut self, symbol: &GestureSymbol) -> Option<String>;
}

/// Sink that ignores commits and commands
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ActionSink for NoopSink {
    fn commit(&mut self, _text: &str) {}

    fn command(&mut self, _symbol: &GestureSymbol) -> Option<String> {
        None
    }
}

/// Apply a symbol to the buffer and report what happened
pub fn dispatch(
    symbol: &GestureSymbol,
    buffer: &mut OutputBuffer,
    sink: &mut dyn ActionSink,
) -> FeedbackMessage {
    match symbol {
        GestureSymbol::Letter(c) if c.is_ascii_uppercase() => {
            buffer.push_char(*c);
            FeedbackMessage::new(FeedbackKind::Typed, format!("✍️ Typed: {}", c))
        }
        GestureSymbol::Letter(c) => FeedbackMessage::new(
            FeedbackKind::Unhandled,
            format!("⚠️ {:?} is not a gesture letter", c),
        ),
        GestureSymbol::Space => {
            buffer.push_space();
            FeedbackMessage::new(FeedbackKind::Space, "␣ Space added")
        }
        GestureSymbol::Delete => match buffer.delete_last() {
            Some(_) => FeedbackMessage::new(FeedbackKind::Deleted, "⌫ Character deleted"),
            None => FeedbackMessage::new(FeedbackKind::NothingToDelete, "⌫ Nothing to delete"),
        },
        GestureSymbol::Enter => {
            sink.commit(buffer.as_str());
            FeedbackMessage::new(FeedbackKind::Commit, "↵ Execute command")
        }
        GestureSymbol::Command(token) => match sink.command(symbol) {
            Some(text) => FeedbackMessage::new(FeedbackKind::Command, text),
            None => FeedbackMessage::new(
                FeedbackKind::Unhandled,
                format!("⚠️ {} not available here", token),
            ),
        },
    }
}
