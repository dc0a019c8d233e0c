//! Keyword and symbol dispatch tables for bracketed markup.

use peg::RuleResult;
use phf::{Map, phf_map};
use serde::Serialize;

/// A text style applied to a nested phrase.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    /// `[* bold]` or `*bold*`.
    Bold,
    /// `['italic]` or `/italic/`.
    Italic,
    /// `[_underline]` or `_underline_`.
    Underline,
    /// `[^teletype]` or `=teletype=`.
    Teletype,
    /// `[-strikethrough]`.
    Strikethrough,
    /// `["quote]`.
    Quote,
    /// `[~replaceable]`.
    Replaceable,
    /// `[footnote text]`.
    Footnote,
}

/// The kind of a cross-reference or link.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    /// `[link target text]`.
    Link,
    /// `[@http://example.com text]`.
    Url,
    /// `[funcref target text]`.
    Function,
    /// `[classref target text]`.
    Class,
    /// `[memberref target text]`.
    Member,
    /// `[enumref target text]`.
    Enum,
    /// `[macroref target text]`.
    Macro,
    /// `[headerref target text]`.
    Header,
    /// `[conceptref target text]`.
    Concept,
    /// `[globalref target text]`.
    Global,
}

/// The language used for code in the rest of the document.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// `[c++]`.
    #[default]
    Cpp,
    /// `[python]`.
    Python,
    /// `[teletype]`.
    Teletype,
}

/// The markup kind selected by a dispatch table entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dispatch {
    /// An anchor.
    Anchor,
    /// A conditional phrase.
    Conditional,
    /// An image.
    Image,
    /// A cross-reference or link.
    Reference(RefKind),
    /// A source mode switch.
    SourceMode(SourceMode),
    /// A styled phrase.
    Style(Style),
}

/// A dispatch table.
pub(super) struct Table {
    /// The length of the longest key, in bytes.
    max_len: usize,
    /// The entries.
    map: Map<&'static str, Dispatch>,
}

/// Bracketed markup triggered by a keyword. A keyword must not be directly
/// followed by an identifier character.
pub(super) static KEYWORDS: Table = Table {
    max_len: "conceptref".len(),
    map: phf_map! {
        "c++" => Dispatch::SourceMode(SourceMode::Cpp),
        "classref" => Dispatch::Reference(RefKind::Class),
        "conceptref" => Dispatch::Reference(RefKind::Concept),
        "enumref" => Dispatch::Reference(RefKind::Enum),
        "footnote" => Dispatch::Style(Style::Footnote),
        "funcref" => Dispatch::Reference(RefKind::Function),
        "globalref" => Dispatch::Reference(RefKind::Global),
        "headerref" => Dispatch::Reference(RefKind::Header),
        "link" => Dispatch::Reference(RefKind::Link),
        "macroref" => Dispatch::Reference(RefKind::Macro),
        "memberref" => Dispatch::Reference(RefKind::Member),
        "python" => Dispatch::SourceMode(SourceMode::Python),
        "teletype" => Dispatch::SourceMode(SourceMode::Teletype),
    },
};

/// Bracketed markup triggered by a punctuation symbol.
pub(super) static SYMBOLS: Table = Table {
    max_len: 1,
    map: phf_map! {
        "\"" => Dispatch::Style(Style::Quote),
        "#" => Dispatch::Anchor,
        "$" => Dispatch::Image,
        "'" => Dispatch::Style(Style::Italic),
        "*" => Dispatch::Style(Style::Bold),
        "-" => Dispatch::Style(Style::Strikethrough),
        "?" => Dispatch::Conditional,
        "@" => Dispatch::Reference(RefKind::Url),
        "^" => Dispatch::Style(Style::Teletype),
        "_" => Dispatch::Style(Style::Underline),
        "~" => Dispatch::Style(Style::Replaceable),
    },
};

/// Finds the longest key of `table` at `pos` in `input`.
pub(super) fn longest_match(table: &Table, input: &str, pos: usize) -> RuleResult<Dispatch> {
    longest_prefix(&input[pos..], table.max_len, |key| table.map.get(key).copied())
        .map_or(RuleResult::Failed, |(len, dispatch)| {
            RuleResult::Matched(pos + len, dispatch)
        })
}

/// Finds the longest prefix of `text` no longer than `max_len` bytes for
/// which `find` returns a value.
pub(crate) fn longest_prefix<'a, T>(
    text: &'a str,
    max_len: usize,
    mut find: impl FnMut(&'a str) -> Option<T>,
) -> Option<(usize, T)> {
    let mut end = max_len.min(text.len());
    while end > 0 {
        if let Some(prefix) = text.get(..end)
            && let Some(value) = find(prefix)
        {
            return Some((end, value));
        }
        end -= 1;
    }
    None
}
