use super::{visit::Visitor, *};
use crate::symbols::SymbolTable;
use core::fmt::{self, Write as _};


/// The definitions used by most tests.
fn symbols() -> SymbolTable {
    let mut table = SymbolTable::new();
    table.define_macro("FOO", "foo");
    table.define_macro("__x__", "x");
    table.define_template("def", ["x"], "([x])");
    table.define_template("pair", ["a", "b"], "<[a]|[b]>");
    table.define_template("+", ["x"], "+[x]");
    table
}

#[track_caller]
fn sexp(input: &str) -> String {
    sexp_with(&Configuration::default(), &symbols(), input)
}

#[track_caller]
fn sexp_with(config: &Configuration, symbols: &SymbolTable, input: &str) -> String {
    let _ = env_logger::try_init();
    let output = Parser::new(config, symbols).parse(input).unwrap();
    log::trace!("{:#?}", inspect(&FileMap::new(input), &output.root));
    render(input, &output.root)
}

/// Renders a token tree as a compact s-expression.
fn render(source: &str, tokens: &[Spanned<Token>]) -> String {
    let mut sexp = Sexp {
        source,
        out: String::new(),
    };
    sexp.visit_tokens(tokens).unwrap();
    sexp.out
}

struct Sexp<'tt> {
    source: &'tt str,
    out: String,
}

impl Sexp<'_> {
    fn item(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        if !self.out.is_empty() && !self.out.ends_with('(') {
            self.out.push(' ');
        }
        self.out.write_fmt(args)
    }
}

impl<'tt> Visitor<'tt, fmt::Error> for Sexp<'tt> {
    fn source(&self) -> &'tt str {
        self.source
    }

    fn visit_anchor(&mut self, _: Span, id: &'tt str) -> fmt::Result {
        self.item(format_args!("(anchor {id:?})"))
    }

    fn visit_break(&mut self, _: Span) -> fmt::Result {
        self.item(format_args!("br"))
    }

    fn visit_code(&mut self, _: Span, content: &'tt str, block: bool) -> fmt::Result {
        let name = if block { "code-block" } else { "code" };
        self.item(format_args!("({name} {content:?})"))
    }

    fn visit_comment(&mut self, _: Span, _: &'tt str) -> fmt::Result {
        self.item(format_args!("(comment)"))
    }

    fn visit_conditional(
        &mut self,
        span: Span,
        name: &'tt str,
        content: &'tt [Spanned<Token>],
    ) -> fmt::Result {
        self.item(format_args!("(? {name}"))?;
        visit::visit_conditional(self, span, name, content)?;
        self.out.push(')');
        Ok(())
    }

    fn visit_image(
        &mut self,
        _: Span,
        fileref: &'tt str,
        attributes: &'tt [Spanned<ImageAttribute>],
    ) -> fmt::Result {
        let source = self.source;
        self.item(format_args!("(image {fileref:?}"))?;
        for attribute in attributes {
            let name = &source[attribute.name.into_range()];
            let value = &source[attribute.value.into_range()];
            self.item(format_args!("{name}={value:?}"))?;
        }
        self.out.push(')');
        Ok(())
    }

    fn visit_macro(&mut self, _: Span, name: &'tt str) -> fmt::Result {
        self.item(format_args!("(macro {name})"))
    }

    fn visit_markup(
        &mut self,
        span: Span,
        style: Style,
        content: &'tt [Spanned<Token>],
    ) -> fmt::Result {
        self.item(format_args!("({style:?}"))?;
        visit::visit_markup(self, span, style, content)?;
        self.out.push(')');
        Ok(())
    }

    fn visit_raw(&mut self, _: Span, content: &'tt str) -> fmt::Result {
        self.item(format_args!("(raw {content:?})"))
    }

    fn visit_raw_char(&mut self, _: Span, value: char) -> fmt::Result {
        self.item(format_args!("(char {value:?})"))
    }

    fn visit_reference(
        &mut self,
        span: Span,
        kind: RefKind,
        target: &'tt str,
        content: &'tt [Spanned<Token>],
    ) -> fmt::Result {
        self.item(format_args!("({kind:?} {target:?}"))?;
        visit::visit_reference(self, span, kind, target, content)?;
        self.out.push(')');
        Ok(())
    }

    fn visit_simple_markup(&mut self, _: Span, style: Style, content: &'tt str) -> fmt::Result {
        self.item(format_args!("(simple {style:?} {content:?})"))
    }

    fn visit_source_mode(&mut self, _: Span, mode: SourceMode) -> fmt::Result {
        self.item(format_args!("(mode {mode:?})"))
    }

    fn visit_template(
        &mut self,
        _: Span,
        name: &'tt str,
        escaped: bool,
        arguments: &'tt [Spanned<TemplateArgument>],
    ) -> fmt::Result {
        let source = self.source;
        let tick = if escaped { "`" } else { "" };
        self.item(format_args!("(template {tick}{name}"))?;
        for argument in arguments {
            let text = &source[argument.span.into_range()];
            self.item(format_args!("{text:?}"))?;
        }
        self.out.push(')');
        Ok(())
    }

    fn visit_text(&mut self, text: &'tt str) -> fmt::Result {
        self.item(format_args!("{text:?}"))
    }

    fn visit_unicode(&mut self, _: Span, value: char) -> fmt::Result {
        self.item(format_args!("(u {value:?})"))
    }
}
