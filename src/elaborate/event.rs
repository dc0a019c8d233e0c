//! Document events emitted by the elaborator.

use crate::phrase::{RefKind, SourceMode, Style};
use indexmap::IndexMap;
use serde::Serialize;

/// Markup which is emitted as an open/close pair.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Markup {
    /// A text style.
    Style(Style),
    /// A cross-reference or link.
    Reference {
        /// The kind of reference.
        kind: RefKind,
        /// The reference target.
        target: String,
    },
}

/// A document event, in document order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// An anchor with the given id.
    Anchor(String),
    /// A line break.
    Break,
    /// Code, highlighted according to the source mode at the point where it
    /// appeared.
    Code {
        /// The source mode.
        source_mode: SourceMode,
        /// The code.
        content: String,
        /// True if the code is a block.
        block: bool,
    },
    /// The end of markup started by an [`Event::Start`].
    End(Markup),
    /// The end of escaped output.
    EscapeEnd,
    /// The start of escaped output. Every following [`Event::RawChar`] up to
    /// the matching [`Event::EscapeEnd`] is written without translation.
    EscapeStart,
    /// An image request.
    Image {
        /// The file reference.
        fileref: String,
        /// The image attributes, in source order.
        attributes: IndexMap<String, String>,
    },
    /// A character written without translation.
    RawChar(char),
    /// The start of markup.
    Start(Markup),
    /// A template invocation which was not expanded.
    Template {
        /// The template name.
        name: String,
        /// True if the invocation was escaped.
        escaped: bool,
        /// The raw argument text.
        arguments: Vec<String>,
    },
    /// A run of plain text.
    Text(String),
    /// A character from a Unicode escape.
    Unicode(char),
}

/// An event list which merges adjacent text runs.
#[derive(Debug, Default)]
pub(super) struct Events(Vec<Event>);

impl Events {
    /// Appends an event.
    pub fn push(&mut self, event: Event) {
        match event {
            Event::Text(text) => self.push_text(&text),
            event => self.0.push(event),
        }
    }

    /// Appends plain text.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        if let Some(Event::Text(last)) = self.0.last_mut() {
            last.push_str(text);
        } else {
            self.0.push(Event::Text(text.to_string()));
        }
    }

    /// Takes the collected events, leaving the list empty.
    pub fn take(&mut self) -> Vec<Event> {
        core::mem::take(&mut self.0)
    }

    /// Replaces the collected events, returning the old ones.
    pub fn replace(&mut self, events: Vec<Event>) -> Vec<Event> {
        core::mem::replace(&mut self.0, events)
    }
}
