//! A parsing expression grammar for QuickBook phrases.
//!
//! This grammar only recognizes markup. Macro and template names are looked
//! up so that invocations can be recognized, but nothing is expanded here.

use super::{
    CommandLine, Dialect, ImageAttribute, Output, Parser, TemplateArgument, Token,
    codemap::{Span, Spanned},
    dispatch::{self, Dispatch, KEYWORDS, RefKind, SYMBOLS, Style},
};
use crate::symbols::{find_macro, find_template};
use memchr::memmem;
use peg::RuleResult;

peg::parser! { pub(super) grammar quickbook(state: &Parser<'_>) for str {
    /// The top-level start rule.
    pub rule start() -> Vec<Spanned<Token>>
    = t:(phrase_item() / stray_close())*
    { reduce_tree(t.into_iter().flatten()) }

    /// A phrase at the start of a block, which ends at the phrase boundary.
    #[no_eof]
    pub rule prefix() -> (Vec<Spanned<Token>>, usize)
    = t:phrase() end:position!()
    { (t, end) }

    /// A sequence of phrases separated by blank lines.
    pub rule paragraphs() -> Vec<Vec<Spanned<Token>>>
    = blank_lines() p:(p:paragraph() blank_lines() { p })*
    { p }

    /// The top-level rule for command-line macro values.
    pub rule simple() -> Vec<Spanned<Token>>
    = simple_phrase()

    /// A command-line macro definition.
    ///
    /// ```text
    /// name=value
    /// ```
    pub rule command_line() -> CommandLine
    = space_char()*
      start:position!() command_line_identifier() end:position!()
      space_char()*
      value:("=" space_char()* v:simple_phrase() space_char()* { v })?
    { CommandLine { name: Span::new(start, end), value: value.map(|root| Output { root }) } }

    /// The top-level rule for template arguments.
    pub rule debug_template_args() -> Vec<Spanned<TemplateArgument>>
    = template_arguments()

    ////////////////////
    // Phrase content //
    ////////////////////

    /// A paragraph. A `]` without a matching `[` is kept as text.
    rule paragraph() -> Vec<Spanned<Token>>
    = t:(phrase_item() / stray_close())+
    { reduce_tree(t.into_iter().flatten()) }

    /// A phrase, which continues until the phrase boundary.
    rule phrase() -> Vec<Spanned<Token>>
    = t:phrase_item()*
    { reduce_tree(t.into_iter().flatten()) }

    /// A single phrase element. Markup which does not match is reprocessed as
    /// plain text one character at a time.
    rule phrase_item() -> Option<Spanned<Token>>
    = common()
    / t:spanned(<plain_char()>) { Some(t) }

    /// Markup which is recognized everywhere in a phrase.
    rule common() -> Option<Spanned<Token>>
    = t:spanned(<macro_expansion()>) { Some(t) }
    / t:spanned(<phrase_markup()>) { Some(t) }
    / t:spanned(<code_block()>) { Some(t) }
    / t:spanned(<inline_code()>) { Some(t) }
    / t:spanned(<simple_format()>) { Some(t) }
    / escape()
    / t:spanned(<comment()>) { Some(t) }

    /// A phrase which recognizes only macros, code, and comments.
    rule simple_phrase() -> Vec<Spanned<Token>>
    = t:simple_phrase_item()*
    { reduce_tree(t) }

    rule simple_phrase_item() -> Spanned<Token>
    = spanned(<macro_expansion()>)
    / spanned(<code_block()>)
    / spanned(<inline_code()>)
    / spanned(<comment()>)
    / spanned(<!"]" [_] { Token::Text }>)

    rule plain_char() -> Token
    = !phrase_end() [_]
    { Token::Text }

    /// A close bracket with no matching open bracket.
    rule stray_close() -> Option<Spanned<Token>>
    = t:spanned(<"]" { Token::Text }>)
    { Some(t) }

    /// The end of a phrase.
    rule phrase_end()
    = "]"
    / assert(!state.preformatted, "blank line") blank_line()

    /// The boundary of simple markup content.
    rule simple_phrase_end()
    = "[" / phrase_end()

    ////////////
    // Macros //
    ////////////

    /// A macro. A macro name must not be followed by an identifier
    /// character.
    ///
    /// ```quickbook
    /// __DATE__
    /// ```
    rule macro_expansion() -> Token
    = start:position!() macro_name() end:position!() !identifier_char()
    { Token::Macro { name: Span::new(start, end) } }

    rule macro_name()
    = #{|input, pos| match find_macro(state.symbols, &input[pos..]) {
        Some(len) => RuleResult::Matched(pos + len, ()),
        None => RuleResult::Failed,
    }}

    rule command_line_identifier()
    = (!(space_char() / "]" / "=") [_])+

    /////////////////////
    // Bracketed forms //
    /////////////////////

    /// Bracketed markup. Keywords and symbols take priority over templates.
    ///
    /// ```quickbook
    /// [* bold] [link target text] [template args] [br]
    /// ```
    #[cache]
    rule phrase_markup() -> Token
    = nested(<
        "["
        t:(
          d:keyword() t:dispatched(d) { t }
        / d:symbol() t:dispatched(d) { t }
        / template()
        / "br" { Token::Break }
        )
        "]"
        { t }
      >)

    rule keyword() -> Dispatch
    = d:#{|input, pos| dispatch::longest_match(&KEYWORDS, input, pos)}
      !identifier_char()
    { d }

    rule symbol() -> Dispatch
    = #{|input, pos| dispatch::longest_match(&SYMBOLS, input, pos)}

    /// The body of bracketed markup after its keyword or symbol.
    rule dispatched(d: Dispatch) -> Token
    = style:({? if let Dispatch::Style(style) = d { Ok(style) } else { Err("style") } })
      blank() content:phrase()
      { Token::Markup { style, content } }
    / kind:({? if let Dispatch::Reference(kind) = d { Ok(kind) } else { Err("reference") } })
      t:reference(kind)
      { t }
    / mode:({? if let Dispatch::SourceMode(mode) = d { Ok(mode) } else { Err("source mode") } })
      { Token::SourceMode(mode) }
    / assert(d == Dispatch::Anchor, "anchor") t:anchor() { t }
    / assert(d == Dispatch::Conditional, "conditional") t:conditional() { t }
    / assert(d == Dispatch::Image, "image") t:image() { t }

    /// A cross-reference or link. The target ends at a hard space.
    ///
    /// ```quickbook
    /// [funcref boost::bind bind]
    /// [@http://example.com example]
    /// ```
    rule reference(kind: RefKind) -> Token
    = (assert(kind == RefKind::Url, "url") / space())
      start:position!() reference_target() end:position!()
      hard_space()
      content:phrase()
    { Token::Reference { kind, target: Span::new(start, end), content } }

    rule reference_target()
    = (!("]" / space_char() / comment()) [_])*

    /// An anchor.
    ///
    /// ```quickbook
    /// [#anchor_id]
    /// ```
    rule anchor() -> Token
    = blank() start:position!() (!phrase_end() [_])* end:position!()
    { Token::Anchor { id: Span::new(start, end) } }

    /// A conditional phrase.
    ///
    /// ```quickbook
    /// [? NAME phrase]
    /// ```
    rule conditional() -> Token
    = blank()
      start:position!() (!(space_char() / "]") [_])+ end:position!()
      content:phrase()
    { Token::Conditional { name: Span::new(start, end), content } }

    /// An image. Attributes are only recognized in 1.5 documents.
    ///
    /// ```quickbook
    /// [$ images/logo.png [width 100px] [alt The logo]]
    /// ```
    rule image() -> Token
    = blank()
      t:(
        assert(state.dialect == Dialect::Qbk15, "1.5 image")
        fileref:image_fileref() hard_space() attributes:image_attribute()*
        { Token::Image { fileref, attributes } }
      / assert(state.dialect == Dialect::Qbk14, "1.4 image")
        start:position!() (!phrase_end() [_])* end:position!()
        { Token::Image { fileref: Span::new(start, end), attributes: Vec::new() } }
      )
      &"]"
    { t }

    /// An image file reference, which may contain spaces.
    rule image_fileref() -> Span
    = start:position!()
      (space_char()* (!(space_char() / phrase_end() / "[") [_])+)+
      end:position!()
    { Span::new(start, end) }

    rule image_attribute() -> Spanned<ImageAttribute>
    = start:position!()
      "["
      name_start:position!() identifier_char()* name_end:position!()
      space()
      value_start:position!() (!(phrase_end() / "[") [_])* value_end:position!()
      "]"
      end:position!()
      space()
    {
        Spanned::new(ImageAttribute {
            name: Span::new(name_start, name_end),
            value: Span::new(value_start, value_end),
        }, start, end)
    }

    ///////////////
    // Templates //
    ///////////////

    /// A template invocation. A template name which starts with punctuation
    /// may be directly followed by arguments; otherwise, the name must end at
    /// a hard space.
    ///
    /// ```quickbook
    /// [name arg1..arg2]
    /// [`escaped]
    /// ```
    rule template() -> Token
    = escaped:"`"?
      t:(
        &[c if state.classes.is_punct(c)] name:template_name() arguments:template_arguments()?
        { (name, arguments) }
      / name:template_name() &hard_space() space() arguments:template_arguments()?
        { (name, arguments) }
      )
      &"]"
    {
        let (name, arguments) = t;
        Token::Template {
            name,
            escaped: escaped.is_some(),
            arguments: arguments.unwrap_or_default(),
        }
    }

    rule template_name() -> Span
    = start:position!()
      #{|input, pos| match find_template(state.symbols, &input[pos..]) {
        Some(len) => RuleResult::Matched(pos + len, ()),
        None => RuleResult::Failed,
      }}
      end:position!()
    { Span::new(start, end) }

    /// Template arguments, separated by `..`.
    rule template_arguments() -> Vec<Spanned<TemplateArgument>>
    = assert(state.dialect == Dialect::Qbk15, "1.5 arguments")
      a:(template_argument_15() ++ "..") { a }
    / assert(state.dialect == Dialect::Qbk14, "1.4 arguments")
      a:(template_argument_14() ++ "..") { a }

    /// A 1.4 template argument. A `[` which does not start a balanced
    /// bracket group is plain text.
    rule template_argument_14() -> Spanned<TemplateArgument>
    = start:position!()
      block:block_argument()
      (brackets_14() / !(".." / "]") [_])+
      end:position!()
    { Spanned::new(TemplateArgument { block }, start, end) }

    #[cache]
    rule brackets_14()
    = nested(<"[" (brackets_14() / !(".." / "]") [_])+ "]">)

    /// A 1.5 template argument, which may contain backslash escapes.
    rule template_argument_15() -> Spanned<TemplateArgument>
    = start:position!()
      block:block_argument()
      (brackets_15() / "\\" [_] / !(".." / "[" / "]") [_])+
      end:position!()
    { Spanned::new(TemplateArgument { block }, start, end) }

    #[cache]
    rule brackets_15()
    = nested(<"[" (brackets_15() / "\\" [_] / !("[" / "]") [_])+ "]">)

    /// Whether an argument starts with a line break.
    rule block_argument() -> bool
    = &([' ' | '\t']* newline()) { true }
    / { false }

    //////////////////
    // Code & style //
    //////////////////

    /// Code delimited by two or three backticks, which may span blank lines.
    ///
    /// ```quickbook
    /// ``int main();``
    /// ```
    rule code_block() -> Token
    = "```" content:until("```") "```" { Token::Code { content, block: true } }
    / "``" content:until("``") "``" { Token::Code { content, block: true } }

    /// Inline code, which must not span a blank line.
    ///
    /// ```quickbook
    /// `std::vector`
    /// ```
    rule inline_code() -> Token
    = "`" start:position!() (!("`" / blank_line()) [_])* end:position!() "`"
    { Token::Code { content: Span::new(start, end), block: false } }

    /// Simple markup.
    ///
    /// ```quickbook
    /// *bold* /italic/ _underline_ =teletype=
    /// ```
    rule simple_format() -> Token
    = simple_markup('*', Style::Bold)
    / simple_markup('/', Style::Italic)
    / simple_markup('_', Style::Underline)
    / simple_markup('=', Style::Teletype)

    /// Simple markup content is either a single graph character or a run
    /// which starts and ends with a graph character and does not contain a
    /// graph character followed by the mark. The closing mark must be followed
    /// by space, punctuation, or the end of the input.
    rule simple_markup(mark: char, style: Style) -> Token
    = [c if c == mark]
      start:position!()
      (
        graph() &simple_markup_close(mark)
      / graph()
        (!(graph() [c if c == mark] / simple_phrase_end()) [_])*
        graph()
        &simple_markup_close(mark)
      )
      end:position!()
      [c if c == mark]
    { Token::SimpleMarkup { style, content: Span::new(start, end) } }

    rule simple_markup_close(mark: char)
    = [c if c == mark]
      ([c if state.classes.is_space(c) || state.classes.is_punct(c)] / ![_])

    /////////////
    // Escapes //
    /////////////

    /// A backslash escape or raw text.
    ///
    /// ```quickbook
    /// \n \[ \u00E9 \U0001F600 '''<raw/>'''
    /// ```
    rule escape() -> Option<Spanned<Token>>
    = t:spanned(<"\\n" { Token::Break }>) { Some(t) }
    / "\\ " { None }
    / t:spanned(<"\\" value:[c if state.classes.is_punct(c)] { Token::RawChar { value } }>) { Some(t) }
    / t:spanned(<"\\u" value:unicode_escape(4) { Token::Unicode { value } }>) { Some(t) }
    / t:spanned(<"\\U" value:unicode_escape(8) { Token::Unicode { value } }>) { Some(t) }
    / t:spanned(<raw()>) { Some(t) }

    /// Exactly `digits` hex digits which encode a Unicode scalar value.
    rule unicode_escape(digits: usize) -> char
    = hex:$(['0'..='9' | 'a'..='f' | 'A'..='F']*<{digits}>)
    {? u32::from_str_radix(hex, 16).ok().and_then(char::from_u32).ok_or("unicode scalar value") }

    /// Raw text. A line break directly after the opening quotes is ignored.
    ///
    /// ```quickbook
    /// '''<emphasis>raw</emphasis>'''
    /// ```
    rule raw() -> Token
    = "'''" ([' ' | '\t']* newline())? content:until("'''") "'''"
    { Token::Raw { content } }

    //////////////
    // Comments //
    //////////////

    /// A comment, which may contain balanced brackets.
    ///
    /// ```quickbook
    /// [/ comment [with brackets]]
    /// ```
    #[cache]
    rule comment() -> Token
    = "[/" start:position!() (dummy_block() / !"]" [_])* end:position!() "]"
    { Token::Comment { content: Span::new(start, end) } }

    #[cache]
    rule dummy_block()
    = nested(<"[" (dummy_block() / !"]" [_])* "]">)

    /////////////
    // Helpers //
    /////////////

    /// Everything up to the next occurrence of `delimiter`.
    rule until(delimiter: &'static str) -> Span
    = #{|input, pos| match memmem::find(&input.as_bytes()[pos..], delimiter.as_bytes()) {
        Some(len) => RuleResult::Matched(pos + len, Span::new(pos, pos + len)),
        None => RuleResult::Failed,
    }}

    rule identifier_char()
    = [c if state.classes.is_identifier(c)]

    rule graph()
    = [c if state.classes.is_graph(c)]

    rule space_char()
    = [c if state.classes.is_space(c)]

    /// Whitespace and comments.
    rule space()
    = (space_char() / comment())*

    /// Spaces, tabs, and comments.
    rule blank()
    = ([c if state.classes.is_blank(c)] / comment())*

    /// A boundary which is not in the middle of an identifier, followed by
    /// optional whitespace.
    rule hard_space()
    = !identifier_char() space()

    rule newline()
    = "\r\n" / "\n" / "\r"

    rule blank_line()
    = [' ' | '\t']* newline() [' ' | '\t']* newline()

    rule blank_lines()
    = ([' ' | '\t']* newline())* ([' ' | '\t']+ ![_])?

    /// A bracket group which counts towards the nesting limit. Groups nested
    /// beyond the limit fail to match.
    rule nested<T>(r: rule<T>) -> T
    = enter_nesting() t:r()? leave_nesting()
    {? t.ok_or("bracket group") }

    rule enter_nesting()
    = #{|_, pos| if state.enter_nesting() {
        RuleResult::Matched(pos, ())
    } else {
        RuleResult::Failed
    }}

    rule leave_nesting()
    = #{|_, pos| {
        state.leave_nesting();
        RuleResult::Matched(pos, ())
    }}

    rule assert(cond: bool, msg: &'static str)
    = {? if cond { Ok(()) } else { Err(msg) }}

    rule spanned<T>(r: rule<T>) -> Spanned<T>
    = start:position!() node:r() end:position!()
    { Spanned::new(node, start, end) }
}}

/// Merges adjacent text tokens.
fn reduce_tree(tokens: impl IntoIterator<Item = Spanned<Token>>) -> Vec<Spanned<Token>> {
    let mut v = Vec::<Spanned<Token>>::new();
    for token in tokens {
        if matches!(token.node, Token::Text)
            && let Some(Spanned {
                span: text_span,
                node: Token::Text,
            }) = v.last_mut()
            && text_span.end == token.span.start
        {
            *text_span = text_span.merge(token.span);
        } else {
            v.push(token);
        }
    }
    v
}
