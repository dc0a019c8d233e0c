//! QuickBook phrase parser.
//!
//! Parsing only recognizes markup. The result is a token tree of spans into
//! the source text, which [`crate::elaborate`] turns into document events.

use crate::symbols::Definitions;
use core::cell::Cell;
pub use chars::CharClasses;
pub use codemap::{FileMap, Span, Spanned};
pub use config::{Configuration, DEFAULT_DEPTH_LIMIT, Dialect, QBK_1_5, Version, VersionError};
pub use dispatch::{RefKind, SourceMode, Style};
pub use inspectors::inspect;
pub use peg::str::LineCol;

mod chars;
mod codemap;
mod config;
pub(crate) mod dispatch;
mod inspectors;
mod parser;
#[cfg(test)]
mod tests;
pub mod visit;

/// A parser error.
pub type Error = peg::error::ParseError<LineCol>;

/// A QuickBook phrase parser.
#[derive(Clone)]
pub struct Parser<'a> {
    /// The definitions used to recognize macros and template names.
    symbols: &'a dyn Definitions,
    /// The template argument dialect.
    dialect: Dialect,
    /// Character classification.
    classes: CharClasses,
    /// If true, blank lines do not end a phrase.
    preformatted: bool,
    /// The current bracket nesting depth.
    nesting: Cell<usize>,
    /// The maximum bracket nesting depth. Deeper brackets are text.
    nesting_limit: usize,
}

impl core::fmt::Debug for Parser<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Parser")
            .field("dialect", &self.dialect)
            .field("classes", &self.classes)
            .field("preformatted", &self.preformatted)
            .field("nesting_limit", &self.nesting_limit)
            .finish_non_exhaustive()
    }
}

impl<'a> Parser<'a> {
    /// Creates a new parser with the given configuration and definitions.
    pub fn new(config: &Configuration, symbols: &'a dyn Definitions) -> Self {
        Self {
            symbols,
            dialect: config.dialect(),
            classes: config.classes,
            preformatted: false,
            nesting: Cell::new(0),
            nesting_limit: config.depth_limit,
        }
    }

    /// Sets whether blank lines end a phrase.
    #[must_use]
    pub fn with_preformatted(mut self, preformatted: bool) -> Self {
        self.preformatted = preformatted;
        self
    }

    /// Parses `source` as one complete phrase.
    ///
    /// A `]` without a matching `[` is treated as text. Reaching a phrase
    /// boundary before the end of the input is an error.
    pub fn parse(&self, source: &str) -> Result<Output, Error> {
        parser::quickbook::start(source, self).map(|root| Output { root })
    }

    /// Parses a phrase from the start of `source`, stopping at the first
    /// phrase boundary. Returns the phrase and the position of the boundary.
    pub fn parse_prefix(&self, source: &str) -> Result<(Output, usize), Error> {
        parser::quickbook::prefix(source, self).map(|(root, end)| (Output { root }, end))
    }

    /// Parses `source` as a sequence of phrases separated by blank lines.
    pub fn parse_paragraphs(&self, source: &str) -> Result<Vec<Output>, Error> {
        parser::quickbook::paragraphs(source, self)
            .map(|paragraphs| paragraphs.into_iter().map(|root| Output { root }).collect())
    }

    /// Parses `source` as a phrase which only recognizes macros, code, and
    /// comments.
    pub fn parse_simple(&self, source: &str) -> Result<Output, Error> {
        parser::quickbook::simple(source, self).map(|root| Output { root })
    }

    /// Parses a command-line macro definition.
    pub fn parse_command_line(&self, source: &str) -> Result<CommandLine, Error> {
        parser::quickbook::command_line(source, self)
    }

    /// Enters a bracket group. Returns false if the group is nested too
    /// deeply.
    fn enter_nesting(&self) -> bool {
        let depth = self.nesting.get();
        if depth >= self.nesting_limit {
            log::trace!("bracket nesting limit {} reached", self.nesting_limit);
            false
        } else {
            self.nesting.set(depth + 1);
            true
        }
    }

    /// Leaves a bracket group entered by [`Self::enter_nesting`].
    fn leave_nesting(&self) {
        self.nesting.set(self.nesting.get().saturating_sub(1));
    }

    /// Parses a template argument list, for debugging purposes.
    pub fn debug_parse_args(&self, args: &str) -> Result<Vec<Spanned<TemplateArgument>>, Error> {
        parser::quickbook::debug_template_args(args, self)
    }
}

/// The output of a phrase parser.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Output {
    /// The root of the token tree.
    pub root: Vec<Spanned<Token>>,
}

/// A parsed command-line macro definition.
///
/// ```text
/// name=value
/// ^^^^ ^^^^^
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandLine {
    /// The macro name.
    pub name: Span,
    /// The macro value, if one was given.
    pub value: Option<Output>,
}

/// A template argument. The span of the argument is its raw source text.
///
/// ```quickbook
/// [template arg1..arg2]
///           ^^^^  ^^^^
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TemplateArgument {
    /// True if the argument starts on a new line.
    pub block: bool,
}

/// An image attribute.
///
/// ```quickbook
/// [$ image.png [width 10px]]
///               ^^^^^ ^^^^
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ImageAttribute {
    /// The attribute name.
    pub name: Span,
    /// The attribute value.
    pub value: Span,
}

/// A parsed phrase token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    /// An anchor.
    ///
    /// ```quickbook
    /// [#anchor_id]
    /// ```
    Anchor {
        /// The anchor identifier.
        id: Span,
    },
    /// A line break.
    ///
    /// ```quickbook
    /// [br] \n
    /// ```
    Break,
    /// Code.
    ///
    /// ```quickbook
    /// `inline` ``block``
    /// ```
    Code {
        /// The code.
        content: Span,
        /// True if the code used double or triple backticks.
        block: bool,
    },
    /// A comment.
    ///
    /// ```quickbook
    /// [/ comment]
    /// ```
    Comment {
        /// The comment text.
        content: Span,
    },
    /// A conditional phrase, shown only if a macro is defined.
    ///
    /// ```quickbook
    /// [? NAME phrase]
    /// ```
    Conditional {
        /// The macro name.
        name: Span,
        /// The phrase.
        content: Vec<Spanned<Token>>,
    },
    /// An image.
    ///
    /// ```quickbook
    /// [$ image.png [width 10px]]
    /// ```
    Image {
        /// The file reference.
        fileref: Span,
        /// The image attributes, in source order.
        attributes: Vec<Spanned<ImageAttribute>>,
    },
    /// A macro expansion.
    ///
    /// ```quickbook
    /// __DATE__
    /// ```
    Macro {
        /// The macro name.
        name: Span,
    },
    /// A styled phrase.
    ///
    /// ```quickbook
    /// [* bold] [footnote text]
    /// ```
    Markup {
        /// The style.
        style: Style,
        /// The phrase.
        content: Vec<Spanned<Token>>,
    },
    /// Raw text.
    ///
    /// ```quickbook
    /// '''<raw/>'''
    /// ```
    Raw {
        /// The raw text.
        content: Span,
    },
    /// An escaped character.
    ///
    /// ```quickbook
    /// \[
    /// ```
    RawChar {
        /// The character.
        value: char,
    },
    /// A cross-reference or link.
    ///
    /// ```quickbook
    /// [link target text]
    /// ```
    Reference {
        /// The kind of reference.
        kind: RefKind,
        /// The reference target.
        target: Span,
        /// The link text.
        content: Vec<Spanned<Token>>,
    },
    /// Simple markup.
    ///
    /// ```quickbook
    /// *bold*
    /// ```
    SimpleMarkup {
        /// The style.
        style: Style,
        /// The marked-up text, which is not parsed.
        content: Span,
    },
    /// A source mode switch.
    ///
    /// ```quickbook
    /// [python]
    /// ```
    SourceMode(SourceMode),
    /// A template invocation.
    ///
    /// ```quickbook
    /// [name arg1..arg2]
    /// ```
    Template {
        /// The template name.
        name: Span,
        /// True if the invocation was escaped with a backtick.
        escaped: bool,
        /// The arguments.
        arguments: Vec<Spanned<TemplateArgument>>,
    },
    /// Plain text.
    Text,
    /// A Unicode escape.
    ///
    /// ```quickbook
    /// \u00E9
    /// ```
    Unicode {
        /// The character.
        value: char,
    },
}
