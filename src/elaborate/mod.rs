//! Phrase elaboration.
//!
//! Elaboration is the second pass over a committed token tree. It expands
//! macros and templates using a definition table and emits a flat list of
//! [`Event`]s, where nesting is represented by matching [`Event::Start`] and
//! [`Event::End`] pairs.
//!
//! Template arguments are elaborated in the scope of the caller before the
//! template body is parsed. Inside the body, each parameter is a template
//! with no parameters which expands to the elaborated argument.

use crate::{
    phrase::{
        Configuration, Dialect, FileMap, ImageAttribute, LineCol, Output, Parser, RefKind,
        SourceMode, Span, Spanned, Style, TemplateArgument, Token,
        visit::{self, Visitor},
    },
    symbols::{Body, Definition, Definitions, Scope, Template},
};
pub use event::{Event, Markup};
use event::Events;
use indexmap::IndexMap;
use std::collections::HashMap;

mod event;
#[cfg(test)]
mod tests;

/// An elaboration error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A template was called with the wrong number of arguments.
    #[error("template '{name}' expects {expected} argument(s) but got {got} at {at}")]
    Arity {
        /// The name of the template.
        name: String,
        /// The number of parameters of the template.
        expected: usize,
        /// The number of arguments after splitting.
        got: usize,
        /// The position of the invocation.
        at: LineCol,
    },

    /// An escaped template was called with arguments.
    #[error("escaped template '{0}' cannot take arguments")]
    EscapedArguments(String),

    /// A backtraced macro or template error.
    #[error("{err}\n  in '{name}'")]
    Expansion {
        /// The name of the macro or template.
        name: String,
        /// The error.
        #[source]
        err: Box<Self>,
    },

    /// An error occurred while parsing a phrase.
    #[error(transparent)]
    Parse(#[from] crate::phrase::Error),

    /// Too many nested expansions.
    #[error("expansion depth limit exceeded: {0}")]
    RecursionLimit(String),
}

/// Elaboration options.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// If false, template invocations are emitted as [`Event::Template`]
    /// instead of being expanded.
    pub expand_templates: bool,
    /// If true, blank lines do not end the top-level phrase.
    pub preformatted: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            expand_templates: true,
            preformatted: false,
        }
    }
}

/// A phrase elaborator.
#[derive(Clone, Copy)]
pub struct Elaborator<'a> {
    /// The parser configuration.
    config: &'a Configuration,
    /// The macro and template definitions.
    symbols: &'a dyn Definitions,
    /// Elaboration options.
    options: Options,
}

impl core::fmt::Debug for Elaborator<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Elaborator")
            .field("config", &self.config)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> Elaborator<'a> {
    /// Creates a new elaborator with the given configuration and definitions.
    pub fn new(config: &'a Configuration, symbols: &'a dyn Definitions) -> Self {
        Self {
            config,
            symbols,
            options: Options::default(),
        }
    }

    /// Sets whether templates are expanded.
    #[must_use]
    pub fn with_expansion(mut self, expand_templates: bool) -> Self {
        self.options.expand_templates = expand_templates;
        self
    }

    /// Sets whether blank lines end the top-level phrase.
    #[must_use]
    pub fn with_preformatted(mut self, preformatted: bool) -> Self {
        self.options.preformatted = preformatted;
        self
    }

    /// Parses and elaborates `source` as one phrase.
    pub fn elaborate(&self, source: &str) -> Result<Vec<Event>, Error> {
        let output = self.parser().parse(source)?;
        self.elaborate_output(source, &output)
    }

    /// Parses and elaborates `source` as a sequence of phrases separated by
    /// blank lines. The source mode carries over from one phrase to the next.
    pub fn elaborate_paragraphs(&self, source: &str) -> Result<Vec<Vec<Event>>, Error> {
        let paragraphs = self.parser().parse_paragraphs(source)?;
        let mut ctx = Context::default();
        paragraphs
            .iter()
            .map(|paragraph| {
                self.frame(&mut ctx, source).visit_output(paragraph)?;
                Ok::<_, Error>(ctx.events.take())
            })
            .collect()
    }

    /// Elaborates a token tree which was parsed from `source`.
    pub fn elaborate_output(&self, source: &str, output: &Output) -> Result<Vec<Event>, Error> {
        let mut ctx = Context::default();
        self.frame(&mut ctx, source).visit_output(output)?;
        Ok(ctx.events.take())
    }

    /// Creates the parser for top-level input.
    fn parser(&self) -> Parser<'a> {
        Parser::new(self.config, self.symbols).with_preformatted(self.options.preformatted)
    }

    /// Creates the root frame.
    fn frame<'s, 'tt>(&'s self, ctx: &'s mut Context, source: &'tt str) -> Frame<'s, 'tt> {
        Frame {
            config: self.config,
            symbols: self.symbols,
            options: self.options,
            ctx,
            source,
            depth: 0,
        }
    }
}

/// Elaboration state which is shared across frames.
#[derive(Debug, Default)]
struct Context {
    /// The emitted events.
    events: Events,
    /// The current source mode.
    source_mode: SourceMode,
}

/// A macro or template expansion frame.
struct Frame<'s, 'tt> {
    /// The parser configuration.
    config: &'s Configuration,
    /// The definitions visible in this frame.
    symbols: &'s dyn Definitions,
    /// Elaboration options.
    options: Options,
    /// Shared state.
    ctx: &'s mut Context,
    /// The source text of the token tree being visited.
    source: &'tt str,
    /// The number of expansions above this frame.
    depth: usize,
}

impl Frame<'_, '_> {
    /// Parses `source` and elaborates it in a child frame using `symbols`.
    fn expand_phrase(
        &mut self,
        name: &str,
        symbols: &dyn Definitions,
        source: &str,
        preformatted: bool,
    ) -> Result<(), Error> {
        if self.depth >= self.config.depth_limit {
            return Err(Error::RecursionLimit(name.to_string()));
        }

        log::trace!("expanding {name} at depth {}", self.depth + 1);
        let output = Parser::new(self.config, symbols)
            .with_preformatted(preformatted)
            .parse(source)?;
        Frame {
            config: self.config,
            symbols,
            options: self.options,
            ctx: &mut *self.ctx,
            source,
            depth: self.depth + 1,
        }
        .visit_output(&output)
    }

    /// Emits the body of a macro or template whose parameters are already
    /// bound by `symbols`.
    fn expand_body(
        &mut self,
        name: &str,
        symbols: &dyn Definitions,
        body: &Body,
        preformatted: bool,
    ) -> Result<(), Error> {
        match body {
            Body::Events(events) => {
                for event in events {
                    self.ctx.events.push(event.clone());
                }
                Ok(())
            }
            Body::Phrase(source) => self
                .expand_phrase(name, symbols, source, preformatted)
                .map_err(|err| Error::Expansion {
                    name: name.to_string(),
                    err: Box::new(err),
                }),
        }
    }

    /// Elaborates a template argument in the scope of the caller. A block
    /// argument loses the line break that made it a block, along with any
    /// blanks before it.
    fn elaborate_argument(&mut self, text: &str, block: bool) -> Result<Vec<Event>, Error> {
        let text = if block {
            strip_newline(text.trim_start_matches([' ', '\t']))
        } else {
            text
        };
        let output = Parser::new(self.config, self.symbols)
            .with_preformatted(true)
            .parse(text)?;

        let saved = self.ctx.events.take();
        let result = Frame {
            config: self.config,
            symbols: self.symbols,
            options: self.options,
            ctx: &mut *self.ctx,
            source: text,
            depth: self.depth,
        }
        .visit_output(&output);
        let events = self.ctx.events.replace(saved);
        result.map(|()| events)
    }

    /// Emits the raw text of a token which could not be elaborated.
    fn fallback(&mut self, span: Span) {
        if let Some(text) = self.source.get(span.into_range()) {
            self.ctx.events.push_text(text);
        }
    }

    /// The position of `span` in the current source.
    fn line_col(&self, span: Span) -> LineCol {
        FileMap::new(self.source).find_line_col(span.start)
    }
}

impl<'tt> Visitor<'tt, Error> for Frame<'_, 'tt> {
    fn source(&self) -> &'tt str {
        self.source
    }

    fn visit_anchor(&mut self, _span: Span, id: &'tt str) -> Result<(), Error> {
        self.ctx.events.push(Event::Anchor(id.trim().to_string()));
        Ok(())
    }

    fn visit_break(&mut self, _span: Span) -> Result<(), Error> {
        self.ctx.events.push(Event::Break);
        Ok(())
    }

    fn visit_code(&mut self, _span: Span, content: &'tt str, block: bool) -> Result<(), Error> {
        self.ctx.events.push(Event::Code {
            source_mode: self.ctx.source_mode,
            content: content.to_string(),
            block,
        });
        Ok(())
    }

    fn visit_conditional(
        &mut self,
        span: Span,
        name: &'tt str,
        content: &'tt [Spanned<Token>],
    ) -> Result<(), Error> {
        let defined = matches!(self.symbols.lookup(name), Some(Definition::Macro(_)));
        log::debug!("conditional {name}: {defined}");
        if defined {
            visit::visit_conditional(self, span, name, content)
        } else {
            Ok(())
        }
    }

    fn visit_image(
        &mut self,
        _span: Span,
        fileref: &'tt str,
        attributes: &'tt [Spanned<ImageAttribute>],
    ) -> Result<(), Error> {
        let mut map = IndexMap::with_capacity(attributes.len());
        for attribute in attributes {
            let name = &self.source[attribute.name.into_range()];
            let value = self.source[attribute.value.into_range()].trim();
            if map.contains_key(name) {
                log::warn!(
                    "duplicate image attribute '{name}' at {}",
                    self.line_col(attribute.span)
                );
            } else {
                map.insert(name.to_string(), value.to_string());
            }
        }

        self.ctx.events.push(Event::Image {
            fileref: fileref.trim().to_string(),
            attributes: map,
        });
        Ok(())
    }

    fn visit_macro(&mut self, span: Span, name: &'tt str) -> Result<(), Error> {
        let symbols = self.symbols;
        if let Some(Definition::Macro(body)) = symbols.lookup(name) {
            self.expand_body(name, symbols, body, false)
        } else {
            log::debug!("macro {name} is no longer defined");
            self.fallback(span);
            Ok(())
        }
    }

    fn visit_markup(
        &mut self,
        span: Span,
        style: Style,
        content: &'tt [Spanned<Token>],
    ) -> Result<(), Error> {
        self.ctx.events.push(Event::Start(Markup::Style(style)));
        visit::visit_markup(self, span, style, content)?;
        self.ctx.events.push(Event::End(Markup::Style(style)));
        Ok(())
    }

    fn visit_raw(&mut self, _span: Span, content: &'tt str) -> Result<(), Error> {
        self.ctx.events.push(Event::EscapeStart);
        for c in content.chars() {
            self.ctx.events.push(Event::RawChar(c));
        }
        self.ctx.events.push(Event::EscapeEnd);
        Ok(())
    }

    fn visit_raw_char(&mut self, _span: Span, value: char) -> Result<(), Error> {
        self.ctx.events.push(Event::RawChar(value));
        Ok(())
    }

    fn visit_reference(
        &mut self,
        span: Span,
        kind: RefKind,
        target: &'tt str,
        content: &'tt [Spanned<Token>],
    ) -> Result<(), Error> {
        let markup = Markup::Reference {
            kind,
            target: target.to_string(),
        };
        self.ctx.events.push(Event::Start(markup.clone()));
        visit::visit_reference(self, span, kind, target, content)?;
        self.ctx.events.push(Event::End(markup));
        Ok(())
    }

    fn visit_simple_markup(
        &mut self,
        _span: Span,
        style: Style,
        content: &'tt str,
    ) -> Result<(), Error> {
        self.ctx.events.push(Event::Start(Markup::Style(style)));
        self.ctx.events.push_text(content);
        self.ctx.events.push(Event::End(Markup::Style(style)));
        Ok(())
    }

    fn visit_source_mode(&mut self, _span: Span, mode: SourceMode) -> Result<(), Error> {
        log::debug!("source mode {mode:?}");
        self.ctx.source_mode = mode;
        Ok(())
    }

    fn visit_template(
        &mut self,
        span: Span,
        name: &'tt str,
        escaped: bool,
        arguments: &'tt [Spanned<TemplateArgument>],
    ) -> Result<(), Error> {
        let source = self.source;
        if !self.options.expand_templates {
            self.ctx.events.push(Event::Template {
                name: name.to_string(),
                escaped,
                arguments: arguments
                    .iter()
                    .map(|argument| source[argument.span.into_range()].to_string())
                    .collect(),
            });
            return Ok(());
        }

        let symbols = self.symbols;
        let Some(Definition::Template(template)) = symbols.lookup(name) else {
            log::debug!("template {name} is no longer defined");
            self.fallback(span);
            return Ok(());
        };

        if escaped {
            if !arguments.is_empty() {
                return Err(Error::EscapedArguments(name.to_string()));
            }
            return self.expand_escaped(template);
        }

        let mut args = arguments
            .iter()
            .map(|argument| (&source[argument.span.into_range()], argument.block))
            .collect::<Vec<_>>();
        break_arguments(&mut args, template.params.len(), self.config.dialect());
        if args.len() != template.params.len() {
            return Err(Error::Arity {
                name: name.to_string(),
                expected: template.params.len(),
                got: args.len(),
                at: self.line_col(span),
            });
        }

        let mut locals = HashMap::with_capacity(args.len());
        for (param, (text, block)) in template.params.iter().zip(args) {
            let events = self.elaborate_argument(text, block)?;
            locals.insert(
                param.clone(),
                Definition::Template(Template {
                    params: Vec::new(),
                    body: Body::Events(events),
                }),
            );
        }

        if locals.is_empty() {
            self.expand_body(name, symbols, &template.body, true)
        } else {
            let scope = Scope::new(symbols, locals);
            self.expand_body(name, &scope, &template.body, true)
        }
    }

    fn visit_text(&mut self, text: &'tt str) -> Result<(), Error> {
        self.ctx.events.push_text(text);
        Ok(())
    }

    fn visit_unicode(&mut self, _span: Span, value: char) -> Result<(), Error> {
        self.ctx.events.push(Event::Unicode(value));
        Ok(())
    }
}

impl Frame<'_, '_> {
    /// Emits the body of an escaped template without elaborating it.
    ///
    /// A body which was already elaborated, such as a template argument, has
    /// no source text left. Its text is emitted as raw characters, and its
    /// other events are passed through unchanged so that the escaped output
    /// keeps its structure.
    fn expand_escaped(&mut self, template: &Template) -> Result<(), Error> {
        self.ctx.events.push(Event::EscapeStart);
        match &template.body {
            Body::Phrase(source) => {
                for c in source.chars() {
                    self.ctx.events.push(Event::RawChar(c));
                }
            }
            Body::Events(events) => {
                for event in events {
                    match event {
                        Event::Text(text) => {
                            for c in text.chars() {
                                self.ctx.events.push(Event::RawChar(c));
                            }
                        }
                        event => self.ctx.events.push(event.clone()),
                    }
                }
            }
        }
        self.ctx.events.push(Event::EscapeEnd);
        Ok(())
    }
}

/// Splits arguments so that their count matches the number of parameters.
///
/// While there are too few arguments, the last argument is split at its first
/// run of whitespace. In 1.5 documents, this only happens when exactly one
/// argument was given. Splitting stops when the last argument has nothing
/// after its first whitespace run.
fn break_arguments<'a>(args: &mut Vec<(&'a str, bool)>, params: usize, dialect: Dialect) {
    if dialect == Dialect::Qbk15 && args.len() != 1 {
        return;
    }

    while args.len() < params {
        let Some((last, _)) = args.last_mut() else {
            return;
        };
        let text: &'a str = *last;
        let Some(l_pos) = text.find(is_argument_space) else {
            return;
        };
        let Some(r_pos) = text[l_pos..]
            .find(|c| !is_argument_space(c))
            .map(|offset| l_pos + offset)
        else {
            return;
        };
        *last = &text[..l_pos];
        args.push((&text[r_pos..], false));
    }
}

/// Removes one leading line break.
fn strip_newline(text: &str) -> &str {
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .or_else(|| text.strip_prefix('\r'))
        .unwrap_or(text)
}

/// Whitespace which separates arguments when splitting.
fn is_argument_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}
