//! Helper trait for implementing token tree visitors.

use super::{
    ImageAttribute, Output, RefKind, SourceMode, Span, Spanned, Style, TemplateArgument, Token,
};

/// A trait for visiting the tokens of a token tree.
pub trait Visitor<'tt, E> {
    /// Returns the source code of the token tree.
    fn source(&self) -> &'tt str;

    /// Visits a [`Token::Anchor`].
    #[inline]
    fn visit_anchor(&mut self, _span: Span, _id: &'tt str) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`Token::Break`].
    #[inline]
    fn visit_break(&mut self, _span: Span) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`Token::Code`].
    #[inline]
    fn visit_code(&mut self, _span: Span, _content: &'tt str, _block: bool) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`Token::Comment`].
    #[inline]
    fn visit_comment(&mut self, _span: Span, _content: &'tt str) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`Token::Conditional`].
    #[inline]
    fn visit_conditional(
        &mut self,
        span: Span,
        name: &'tt str,
        content: &'tt [Spanned<Token>],
    ) -> Result<(), E> {
        visit_conditional(self, span, name, content)
    }

    /// Visits a [`Token::Image`].
    #[inline]
    fn visit_image(
        &mut self,
        _span: Span,
        _fileref: &'tt str,
        _attributes: &'tt [Spanned<ImageAttribute>],
    ) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`Token::Macro`].
    #[inline]
    fn visit_macro(&mut self, _span: Span, _name: &'tt str) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`Token::Markup`].
    #[inline]
    fn visit_markup(
        &mut self,
        span: Span,
        style: Style,
        content: &'tt [Spanned<Token>],
    ) -> Result<(), E> {
        visit_markup(self, span, style, content)
    }

    /// Visits an [`Output`].
    #[inline]
    fn visit_output(&mut self, output: &'tt Output) -> Result<(), E> {
        visit_output(self, output)
    }

    /// Visits a [`Token::Raw`].
    #[inline]
    fn visit_raw(&mut self, _span: Span, _content: &'tt str) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`Token::RawChar`].
    #[inline]
    fn visit_raw_char(&mut self, _span: Span, _value: char) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`Token::Reference`].
    #[inline]
    fn visit_reference(
        &mut self,
        span: Span,
        kind: RefKind,
        target: &'tt str,
        content: &'tt [Spanned<Token>],
    ) -> Result<(), E> {
        visit_reference(self, span, kind, target, content)
    }

    /// Visits a [`Token::SimpleMarkup`].
    #[inline]
    fn visit_simple_markup(
        &mut self,
        _span: Span,
        _style: Style,
        content: &'tt str,
    ) -> Result<(), E> {
        self.visit_text(content)
    }

    /// Visits a [`Token::SourceMode`].
    #[inline]
    fn visit_source_mode(&mut self, _span: Span, _mode: SourceMode) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`Token::Template`].
    #[inline]
    fn visit_template(
        &mut self,
        _span: Span,
        _name: &'tt str,
        _escaped: bool,
        _arguments: &'tt [Spanned<TemplateArgument>],
    ) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`Token::Text`].
    #[inline]
    fn visit_text(&mut self, _text: &'tt str) -> Result<(), E> {
        Ok(())
    }

    /// Visits a [`Spanned<Token>`].
    #[inline]
    fn visit_token(&mut self, token: &'tt Spanned<Token>) -> Result<(), E> {
        visit_token(self, token)
    }

    /// Visits a list of [`Spanned<Token>`].
    #[inline]
    fn visit_tokens(&mut self, tokens: &'tt [Spanned<Token>]) -> Result<(), E> {
        visit_tokens(self, tokens)
    }

    /// Visits a [`Token::Unicode`].
    #[inline]
    fn visit_unicode(&mut self, _span: Span, _value: char) -> Result<(), E> {
        Ok(())
    }
}

/// Default implementation of [`Visitor::visit_conditional`].
#[inline]
pub fn visit_conditional<'tt, V, E>(
    visitor: &mut V,
    _span: Span,
    _name: &'tt str,
    content: &'tt [Spanned<Token>],
) -> Result<(), E>
where
    V: Visitor<'tt, E> + ?Sized,
{
    visitor.visit_tokens(content)
}

/// Default implementation of [`Visitor::visit_markup`].
#[inline]
pub fn visit_markup<'tt, V, E>(
    visitor: &mut V,
    _span: Span,
    _style: Style,
    content: &'tt [Spanned<Token>],
) -> Result<(), E>
where
    V: Visitor<'tt, E> + ?Sized,
{
    visitor.visit_tokens(content)
}

/// Default implementation of [`Visitor::visit_output`].
#[inline]
pub fn visit_output<'tt, V, E>(visitor: &mut V, output: &'tt Output) -> Result<(), E>
where
    V: Visitor<'tt, E> + ?Sized,
{
    visitor.visit_tokens(&output.root)
}

/// Default implementation of [`Visitor::visit_reference`].
#[inline]
pub fn visit_reference<'tt, V, E>(
    visitor: &mut V,
    _span: Span,
    _kind: RefKind,
    _target: &'tt str,
    content: &'tt [Spanned<Token>],
) -> Result<(), E>
where
    V: Visitor<'tt, E> + ?Sized,
{
    visitor.visit_tokens(content)
}

/// Default implementation of [`Visitor::visit_token`].
pub fn visit_token<'tt, V, E>(visitor: &mut V, token: &'tt Spanned<Token>) -> Result<(), E>
where
    V: Visitor<'tt, E> + ?Sized,
{
    let span = token.span;
    match &token.node {
        Token::Anchor { id } => visitor.visit_anchor(span, &visitor.source()[id.into_range()]),
        Token::Break => visitor.visit_break(span),
        Token::Code { content, block } => {
            visitor.visit_code(span, &visitor.source()[content.into_range()], *block)
        }
        Token::Comment { content } => {
            visitor.visit_comment(span, &visitor.source()[content.into_range()])
        }
        Token::Conditional { name, content } => {
            visitor.visit_conditional(span, &visitor.source()[name.into_range()], content)
        }
        Token::Image {
            fileref,
            attributes,
        } => visitor.visit_image(span, &visitor.source()[fileref.into_range()], attributes),
        Token::Macro { name } => visitor.visit_macro(span, &visitor.source()[name.into_range()]),
        Token::Markup { style, content } => visitor.visit_markup(span, *style, content),
        Token::Raw { content } => visitor.visit_raw(span, &visitor.source()[content.into_range()]),
        Token::RawChar { value } => visitor.visit_raw_char(span, *value),
        Token::Reference {
            kind,
            target,
            content,
        } => visitor.visit_reference(
            span,
            *kind,
            &visitor.source()[target.into_range()],
            content,
        ),
        Token::SimpleMarkup { style, content } => {
            visitor.visit_simple_markup(span, *style, &visitor.source()[content.into_range()])
        }
        Token::SourceMode(mode) => visitor.visit_source_mode(span, *mode),
        Token::Template {
            name,
            escaped,
            arguments,
        } => visitor.visit_template(
            span,
            &visitor.source()[name.into_range()],
            *escaped,
            arguments,
        ),
        Token::Text => visitor.visit_text(&visitor.source()[span.into_range()]),
        Token::Unicode { value } => visitor.visit_unicode(span, *value),
    }
}

/// Default implementation of [`Visitor::visit_tokens`].
#[inline]
pub fn visit_tokens<'tt, V, E>(visitor: &mut V, tokens: &'tt [Spanned<Token>]) -> Result<(), E>
where
    V: Visitor<'tt, E> + ?Sized,
{
    for token in tokens {
        visitor.visit_token(token)?;
    }
    Ok(())
}
