//! Macro and template definitions.

use crate::{
    elaborate::{self, Elaborator, Event},
    phrase::{Configuration, Parser, dispatch::longest_prefix},
};
use std::collections::HashMap;
use time::{OffsetDateTime, macros::format_description};

/// The body of a macro or template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Body {
    /// Phrase source which is parsed when the definition is expanded.
    Phrase(String),
    /// Events which were elaborated when the definition was created.
    Events(Vec<Event>),
}

/// A template definition.
///
/// ```quickbook
/// [template name[first second] body]
///               ^^^^^^^^^^^^^^ ^^^^
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Template {
    /// The parameter names.
    pub params: Vec<String>,
    /// The template body.
    pub body: Body,
}

/// A named definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Definition {
    /// A macro, expanded when its name appears in a phrase.
    ///
    /// ```quickbook
    /// __DATE__
    /// ```
    Macro(Body),
    /// A template, expanded when invoked in brackets.
    ///
    /// ```quickbook
    /// [name arg1..arg2]
    /// ```
    Template(Template),
}

/// The definition lookup used during parsing and elaboration.
pub trait Definitions {
    /// Finds the definition with the given name.
    fn lookup(&self, name: &str) -> Option<&Definition>;

    /// The length, in bytes, of the longest defined name.
    fn max_name_len(&self) -> usize;
}

/// Returns the length of the longest macro name at the start of `text`.
pub(crate) fn find_macro(definitions: &dyn Definitions, text: &str) -> Option<usize> {
    longest_prefix(text, definitions.max_name_len(), |name| {
        matches!(definitions.lookup(name), Some(Definition::Macro(_))).then_some(())
    })
    .map(|(len, ())| len)
}

/// Returns the length of the longest template name at the start of `text`.
pub(crate) fn find_template(definitions: &dyn Definitions, text: &str) -> Option<usize> {
    longest_prefix(text, definitions.max_name_len(), |name| {
        matches!(definitions.lookup(name), Some(Definition::Template(_))).then_some(())
    })
    .map(|(len, ())| len)
}

/// A global definition table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    /// The definitions.
    definitions: HashMap<String, Definition>,
    /// The longest name ever defined, in bytes.
    max_name_len: usize,
}

impl SymbolTable {
    /// Creates a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition, returning the definition it replaced.
    pub fn define(&mut self, name: impl Into<String>, definition: Definition) -> Option<Definition> {
        let name = name.into();
        self.max_name_len = self.max_name_len.max(name.len());
        if self.definitions.contains_key(&name) {
            log::debug!("redefining {name}");
        }
        self.definitions.insert(name, definition)
    }

    /// Defines a macro which expands to the given phrase.
    pub fn define_macro(&mut self, name: impl Into<String>, phrase: impl Into<String>) {
        self.define(name, Definition::Macro(Body::Phrase(phrase.into())));
    }

    /// Defines a template with the given parameter names and body phrase.
    pub fn define_template<P>(
        &mut self,
        name: impl Into<String>,
        params: impl IntoIterator<Item = P>,
        body: impl Into<String>,
    ) where
        P: Into<String>,
    {
        self.define(
            name,
            Definition::Template(Template {
                params: params.into_iter().map(Into::into).collect(),
                body: Body::Phrase(body.into()),
            }),
        );
    }

    /// Defines a macro from a command-line definition in the form
    /// `name=value` or `name`.
    ///
    /// The value is elaborated immediately using the definitions that are
    /// already in the table.
    pub fn define_command_line(
        &mut self,
        config: &Configuration,
        definition: &str,
    ) -> Result<(), elaborate::Error> {
        let parsed = Parser::new(config, &*self).parse_command_line(definition)?;
        let events = match &parsed.value {
            Some(value) => Elaborator::new(config, &*self).elaborate_output(definition, value)?,
            None => Vec::new(),
        };
        let name = &definition[parsed.name.into_range()];
        log::debug!("command line definition of {name}");
        self.define(name, Definition::Macro(Body::Events(events)));
        Ok(())
    }

    /// Defines the built-in `__DATE__`, `__TIME__` and `__FILENAME__` macros.
    pub fn define_builtins(
        &mut self,
        filename: &str,
        now: OffsetDateTime,
    ) -> Result<(), time::error::Format> {
        let date = now.format(format_description!("[year]-[month repr:short]-[day]"))?;
        let time = now.format(format_description!(
            "[hour repr:12]:[minute]:[second] [period]"
        ))?;
        for (name, value) in [
            ("__DATE__", date),
            ("__TIME__", time),
            ("__FILENAME__", filename.to_string()),
        ] {
            self.define(name, Definition::Macro(Body::Events(vec![Event::Text(value)])));
        }
        Ok(())
    }

    /// Removes a definition.
    pub fn remove(&mut self, name: &str) -> Option<Definition> {
        self.definitions.remove(name)
    }
}

impl Definitions for SymbolTable {
    fn lookup(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    fn max_name_len(&self) -> usize {
        self.max_name_len
    }
}

/// A local scope which shadows a parent definition table, used for template
/// parameters.
pub(crate) struct Scope<'p> {
    /// The enclosing definitions.
    parent: &'p dyn Definitions,
    /// The local definitions.
    locals: HashMap<String, Definition>,
    /// The longest local name, in bytes.
    max_name_len: usize,
}

impl<'p> Scope<'p> {
    /// Creates a new scope with the given local definitions.
    pub fn new(parent: &'p dyn Definitions, locals: HashMap<String, Definition>) -> Self {
        let max_name_len = locals.keys().map(String::len).max().unwrap_or_default();
        Self {
            parent,
            locals,
            max_name_len,
        }
    }
}

impl Definitions for Scope<'_> {
    fn lookup(&self, name: &str) -> Option<&Definition> {
        self.locals
            .get(name)
            .or_else(|| self.parent.lookup(name))
    }

    fn max_name_len(&self) -> usize {
        self.max_name_len.max(self.parent.max_name_len())
    }
}
