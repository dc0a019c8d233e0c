//! Helpers for improved debug formatting of token trees.

use super::{
    ImageAttribute, TemplateArgument, Token,
    codemap::{FileMap, Spanned},
};
use core::fmt::{self, Write as _};

/// Returns a debug inspector for a token list using the given source code.
pub fn inspect<'a, T>(input: &'a FileMap<'a>, tree: &'a [T]) -> VInspector<'a, T::Inspector<'a>>
where
    T: Inspectable,
    T::Inspector<'a>: TInspector<'a, Inspectee = T>,
{
    VInspector::<'a, T::Inspector<'a>>(input, tree)
}

/// An inspectable type.
pub trait Inspectable {
    /// The default inspector for the type.
    type Inspector<'a>: TInspector<'a>;
}

/// Convenience macro for defining inspectable types.
macro_rules! inspectable {
    ($($ty:ty => $by:ident),*, $(,)?) => {
        $(impl Inspectable for Spanned<$ty> {
            type Inspector<'a> = $by<'a>;
        })*
    }
}

inspectable! {
    ImageAttribute => ImageAttributeInspector,
    TemplateArgument => TemplateArgumentInspector,
    Token => TokenInspector,
}

/// A trait for debug formatting of various parser items.
pub trait TInspector<'a>: fmt::Debug {
    /// The type to be inspected.
    type Inspectee;
    /// Create an debug formatter for the given object.
    fn inspect(input: &'a FileMap<'a>, object: &'a Self::Inspectee) -> Self
    where
        Self: Sized;
}

/// A debug formatter for slices of parser items.
pub struct VInspector<'a, T>(&'a FileMap<'a>, &'a [T::Inspectee])
where
    T: TInspector<'a>;

impl<'a, T> fmt::Debug for VInspector<'a, T>
where
    T: TInspector<'a>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.1.iter().map(|inspect| T::inspect(self.0, inspect)))
            .finish()
    }
}

/// A debug formatter for [`ImageAttribute`].
pub struct ImageAttributeInspector<'a>(&'a FileMap<'a>, &'a Spanned<ImageAttribute>);

impl<'a> TInspector<'a> for ImageAttributeInspector<'a> {
    type Inspectee = Spanned<ImageAttribute>;

    fn inspect(input: &'a FileMap<'a>, object: &'a Self::Inspectee) -> Self {
        Self(input, object)
    }
}

impl fmt::Debug for ImageAttributeInspector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entry(
                &&self.0[self.1.name.into_range()],
                &&self.0[self.1.value.into_range()],
            )
            .finish()
    }
}

/// A debug formatter for [`TemplateArgument`].
pub struct TemplateArgumentInspector<'a>(&'a FileMap<'a>, &'a Spanned<TemplateArgument>);

impl<'a> TInspector<'a> for TemplateArgumentInspector<'a> {
    type Inspectee = Spanned<TemplateArgument>;

    fn inspect(input: &'a FileMap<'a>, object: &'a Self::Inspectee) -> Self {
        Self(input, object)
    }
}

impl fmt::Debug for TemplateArgumentInspector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.1.block { "Block" } else { "Inline" };
        f.debug_tuple(&span_name(name, self.0, self.1))
            .field(&&self.0[self.1.span.into_range()])
            .finish()
    }
}

/// A debug formatter for [`Spanned<Token>`].
pub struct TokenInspector<'a>(&'a FileMap<'a>, &'a Spanned<Token>);

impl<'a> TInspector<'a> for TokenInspector<'a> {
    type Inspectee = Spanned<Token>;

    fn inspect(input: &'a FileMap<'a>, object: &'a Self::Inspectee) -> Self {
        Self(input, object)
    }
}

impl fmt::Debug for TokenInspector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.1.node {
            Token::Anchor { id } => f
                .debug_tuple(&span_name("Anchor", self.0, self.1))
                .field(&&self.0[id.into_range()])
                .finish(),
            Token::Break => f.write_str(&span_name("(br)", self.0, self.1)),
            Token::Code { content, block } => f
                .debug_struct(&span_name("Code", self.0, self.1))
                .field("content", &&self.0[content.into_range()])
                .field("block", block)
                .finish(),
            Token::Comment { content } => f
                .debug_tuple(&span_name("Comment", self.0, self.1))
                .field(&&self.0[content.into_range()])
                .finish(),
            Token::Conditional { name, content } => f
                .debug_struct(&span_name("Conditional", self.0, self.1))
                .field("name", &&self.0[name.into_range()])
                .field(
                    "content",
                    &VInspector::<TokenInspector<'_>>(self.0, content),
                )
                .finish(),
            Token::Image {
                fileref,
                attributes,
            } => f
                .debug_struct(&span_name("Image", self.0, self.1))
                .field("fileref", &&self.0[fileref.into_range()])
                .field(
                    "attributes",
                    &VInspector::<ImageAttributeInspector<'_>>(self.0, attributes),
                )
                .finish(),
            Token::Macro { name } => f
                .debug_tuple(&span_name("Macro", self.0, self.1))
                .field(&&self.0[name.into_range()])
                .finish(),
            Token::Markup { style, content } => f
                .debug_struct(&span_name("Markup", self.0, self.1))
                .field("style", style)
                .field(
                    "content",
                    &VInspector::<TokenInspector<'_>>(self.0, content),
                )
                .finish(),
            Token::Raw { content } => f
                .debug_tuple(&span_name("Raw", self.0, self.1))
                .field(&&self.0[content.into_range()])
                .finish(),
            Token::RawChar { value } => f
                .debug_tuple(&span_name("RawChar", self.0, self.1))
                .field(value)
                .finish(),
            Token::Reference {
                kind,
                target,
                content,
            } => f
                .debug_struct(&span_name("Reference", self.0, self.1))
                .field("kind", kind)
                .field("target", &&self.0[target.into_range()])
                .field(
                    "content",
                    &VInspector::<TokenInspector<'_>>(self.0, content),
                )
                .finish(),
            Token::SimpleMarkup { style, content } => f
                .debug_struct(&span_name("SimpleMarkup", self.0, self.1))
                .field("style", style)
                .field("content", &&self.0[content.into_range()])
                .finish(),
            Token::SourceMode(mode) => f
                .debug_tuple(&span_name("SourceMode", self.0, self.1))
                .field(mode)
                .finish(),
            Token::Template {
                name,
                escaped,
                arguments,
            } => f
                .debug_struct(&span_name("Template", self.0, self.1))
                .field("name", &&self.0[name.into_range()])
                .field("escaped", escaped)
                .field(
                    "arguments",
                    &VInspector::<TemplateArgumentInspector<'_>>(self.0, arguments),
                )
                .finish(),
            Token::Text => fmt::Debug::fmt(&&self.0[self.1.span.into_range()], f),
            Token::Unicode { value } => f
                .debug_tuple(&span_name("Unicode", self.0, self.1))
                .field(value)
                .finish(),
        }
    }
}

/// Decorates an item name with the line and column information of the object in
/// the source code.
fn span_name<T>(name: &str, input: &FileMap<'_>, spanned: &Spanned<T>) -> String {
    let start = input.find_line_col(spanned.span.start);
    let end = input.find_line_col(spanned.span.end);
    let mut out = format!("{name} @ {start}..");
    // Writing to a `String` cannot fail.
    let _ = if start.line == end.line {
        write!(out, "{}", end.column)
    } else {
        write!(out, "{}:{}", end.line, end.column)
    };
    out
}
