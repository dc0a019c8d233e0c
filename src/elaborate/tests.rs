use super::*;
use crate::{
    phrase::{CharClasses, Version},
    symbols::SymbolTable,
};
use time::macros::datetime;

const BASE_DIR: &str = "./src/elaborate/tests";

macro_rules! run_tests {
    ($($name:ident),* $(,)?) => {
        $(#[test]
        fn $name() {
            run_test(
                stringify!($name),
                include_str!(concat!("./tests/", stringify!($name), ".qbk"))
            );
        })*
    }
}

#[track_caller]
fn run_test(test_name: &str, input: &str) {
    use std::io::Write as _;

    let _ = env_logger::try_init();
    let mut mint = goldenfile::Mint::new(format!("{BASE_DIR}/goldenfiles"));
    let mut file = mint.new_goldenfile(format!("{test_name}.json")).unwrap();
    let config = Configuration::default();
    let symbols = symbols();
    let result = Elaborator::new(&config, &symbols)
        .elaborate_paragraphs(input)
        .unwrap();
    let _ = writeln!(file, "{}", serde_json::to_string_pretty(&result).unwrap());
}

run_tests! {
    markup,
    templates,
}

fn symbols() -> SymbolTable {
    let mut table = SymbolTable::new();
    table.define_macro("VERSION", "*1.0*");
    table.define_template("def", ["x"], "([x])");
    table.define_template("pair", ["a", "b"], "<[a]|[b]>");
    table.define_template("triple", ["a", "b", "c"], "[a][b][c]");
    table
}

#[track_caller]
fn elaborate(input: &str) -> Vec<Event> {
    elaborate_with(&Configuration::default(), &symbols(), input)
}

#[track_caller]
fn elaborate_with(config: &Configuration, symbols: &SymbolTable, input: &str) -> Vec<Event> {
    let _ = env_logger::try_init();
    Elaborator::new(config, symbols).elaborate(input).unwrap()
}

#[track_caller]
fn elaborate_err(config: &Configuration, symbols: &SymbolTable, input: &str) -> Error {
    let _ = env_logger::try_init();
    Elaborator::new(config, symbols)
        .elaborate(input)
        .unwrap_err()
}

/// Follows expansion backtraces to the error which started them.
fn root_cause(mut err: &Error) -> &Error {
    while let Error::Expansion { err: inner, .. } = err {
        err = &**inner;
    }
    err
}

fn text(text: &str) -> Event {
    Event::Text(text.into())
}

fn start(style: Style) -> Event {
    Event::Start(Markup::Style(style))
}

fn end(style: Style) -> Event {
    Event::End(Markup::Style(style))
}

fn qbk_1_4() -> Configuration {
    Configuration::new(Version(104))
}

#[test]
fn plain_text() {
    let input = "No markup here, only text: 1 + 1 = 2.";
    assert_eq!(elaborate(input), [text(input)]);
}

#[test]
fn simple_bold() {
    assert_eq!(
        elaborate("*x*"),
        [start(Style::Bold), text("x"), end(Style::Bold)]
    );
}

#[test]
fn digits_are_not_markup() {
    assert_eq!(elaborate("3*4*5"), [text("3*4*5")]);
}

#[test]
fn short_unicode_escape() {
    assert_eq!(elaborate(r"\uA9"), [text(r"\uA9")]);
    assert_eq!(elaborate(r"\u00A9"), [Event::Unicode('\u{a9}')]);
}

#[test]
fn nested_markup() {
    assert_eq!(
        elaborate("[* bold /italic/ end]"),
        [
            start(Style::Bold),
            text("bold "),
            start(Style::Italic),
            text("italic"),
            end(Style::Italic),
            text(" end"),
            end(Style::Bold),
        ]
    );
}

#[test]
fn unterminated_code() {
    assert_eq!(
        elaborate("`abc [* x]"),
        [text("`abc "), start(Style::Bold), text("x"), end(Style::Bold)]
    );
}

#[test]
fn blank_line_boundary() {
    let config = Configuration::default();
    let symbols = symbols();
    let err = elaborate_err(&config, &symbols, "a\n\nb");
    assert!(matches!(err, Error::Parse(_)), "{err}");

    let elaborator = Elaborator::new(&config, &symbols);
    assert_eq!(
        elaborator.elaborate_paragraphs("a\n\nb").unwrap(),
        [vec![text("a")], vec![text("b")]]
    );
    assert_eq!(
        elaborator.with_preformatted(true).elaborate("a\n\nb").unwrap(),
        [text("a\n\nb")]
    );
}

#[test]
fn escapes() {
    assert_eq!(elaborate(r"a\ b"), [text("ab")]);
    assert_eq!(
        elaborate(r"a\n\*"),
        [text("a"), Event::Break, Event::RawChar('*')]
    );
    assert_eq!(
        elaborate("'''<b>'''"),
        [
            Event::EscapeStart,
            Event::RawChar('<'),
            Event::RawChar('b'),
            Event::RawChar('>'),
            Event::EscapeEnd,
        ]
    );
}

#[test]
fn anchors_and_references() {
    assert_eq!(
        elaborate("[# top ][link sec the text]"),
        [
            Event::Anchor("top".into()),
            Event::Start(Markup::Reference {
                kind: RefKind::Link,
                target: "sec".into(),
            }),
            text("the text"),
            Event::End(Markup::Reference {
                kind: RefKind::Link,
                target: "sec".into(),
            }),
        ]
    );
}

#[test]
fn source_mode() {
    let code = |source_mode, content: &str| Event::Code {
        source_mode,
        content: content.into(),
        block: false,
    };
    assert_eq!(
        elaborate("`a`[python]`b` [c++]`c`"),
        [
            code(SourceMode::Cpp, "a"),
            code(SourceMode::Python, "b"),
            text(" "),
            code(SourceMode::Cpp, "c"),
        ]
    );
}

#[test]
fn source_mode_carries_across_paragraphs() {
    let config = Configuration::default();
    let symbols = symbols();
    let paragraphs = Elaborator::new(&config, &symbols)
        .elaborate_paragraphs("[python]\n\n``x``")
        .unwrap();
    assert_eq!(
        paragraphs,
        [
            vec![],
            vec![Event::Code {
                source_mode: SourceMode::Python,
                content: "x".into(),
                block: true,
            }],
        ]
    );
}

#[test]
fn image_attributes_keep_first() {
    let events = elaborate("[$ a.png [width 1] [height  2 ] [width 3]]");
    let [Event::Image { fileref, attributes }] = &events[..] else {
        panic!("unexpected {events:?}");
    };
    assert_eq!(fileref, "a.png");
    assert_eq!(
        attributes.iter().collect::<Vec<_>>(),
        [
            (&"width".to_string(), &"1".to_string()),
            (&"height".to_string(), &"2".to_string()),
        ]
    );
}

#[test]
fn macros() {
    assert_eq!(
        elaborate("v VERSION!"),
        [
            text("v "),
            start(Style::Bold),
            text("1.0"),
            end(Style::Bold),
            text("!"),
        ]
    );
}

#[test]
fn builtin_macros() {
    let config = Configuration::default();
    let mut symbols = symbols();
    symbols
        .define_builtins("doc.qbk", datetime!(2026-10-18 09:30:00 UTC))
        .unwrap();
    assert_eq!(
        elaborate_with(&config, &symbols, "__FILENAME__, __DATE__, __TIME__"),
        [text("doc.qbk, 2026-Oct-18, 09:30:00 AM")]
    );
}

#[test]
fn conditional_phrases() {
    let config = Configuration::default();
    let mut symbols = symbols();
    symbols.define_command_line(&config, "FLAG").unwrap();
    assert_eq!(
        elaborate_with(&config, &symbols, "[? FLAG yes][? NOPE no][? def no]"),
        [text(" yes")]
    );
}

#[test]
fn command_line_macro_value() {
    let config = Configuration::default();
    let mut symbols = symbols();
    symbols.define_command_line(&config, "NAME=a VERSION").unwrap();
    assert_eq!(
        elaborate_with(&config, &symbols, "NAME."),
        [
            text("a "),
            start(Style::Bold),
            text("1.0"),
            end(Style::Bold),
            text("."),
        ]
    );
}

#[test]
fn template_expansion() {
    assert_eq!(elaborate("[pair x..y]"), [text("<x|y>")]);
    assert_eq!(
        elaborate("[def *b*]"),
        [text("("), start(Style::Bold), text("b"), end(Style::Bold), text(")")]
    );
}

#[test]
fn block_argument_keeps_blank_lines() {
    assert_eq!(elaborate("[pair x..\n\n y]"), [text("<x|\n y>")]);
    assert_eq!(elaborate("[pair x..  \r\nz]"), [text("<x|z>")]);
}

#[test]
fn strip_newline_removes_one_line_break() {
    assert_eq!(strip_newline("\r\n\nx"), "\nx");
    assert_eq!(strip_newline("\n\rx"), "\rx");
    assert_eq!(strip_newline("x\n"), "x\n");
}

#[test]
fn single_argument_is_split() {
    assert_eq!(elaborate("[pair x  y z]"), [text("<x|y z>")]);
    assert_eq!(
        elaborate_with(&qbk_1_4(), &symbols(), "[triple x..y z]"),
        [text("xyz")]
    );
}

#[test]
fn escaped_separator_is_one_argument() {
    assert_eq!(
        elaborate(r"[def a\..b]"),
        [text("(a"), Event::RawChar('.'), text(".b)")]
    );
    assert_eq!(
        elaborate_with(&qbk_1_4(), &symbols(), "[pair a..b]"),
        [text("<a|b>")]
    );
}

#[test]
fn wrong_argument_count() {
    let config = Configuration::default();
    let symbols = symbols();
    let err = elaborate_err(&config, &symbols, "x\n[triple x..y z]");
    let Error::Arity {
        name,
        expected,
        got,
        at,
    } = &err
    else {
        panic!("unexpected {err}");
    };
    assert_eq!((name.as_str(), *expected, *got), ("triple", 3, 2));
    assert_eq!((at.line, at.column), (2, 1));

    let err = elaborate_err(&qbk_1_4(), &symbols, "[def]");
    assert!(
        matches!(err, Error::Arity { expected: 1, got: 0, .. }),
        "{err}"
    );
}

#[test]
fn escaped_templates() {
    assert_eq!(
        elaborate("[`def]"),
        [
            Event::EscapeStart,
            Event::RawChar('('),
            Event::RawChar('['),
            Event::RawChar('x'),
            Event::RawChar(']'),
            Event::RawChar(')'),
            Event::EscapeEnd,
        ]
    );

    let mut symbols = symbols();
    symbols.define_template("quote", ["a"], "[`a]");
    assert_eq!(
        elaborate_with(&Configuration::default(), &symbols, "[quote *b*]"),
        [
            Event::EscapeStart,
            start(Style::Bold),
            Event::RawChar('b'),
            end(Style::Bold),
            Event::EscapeEnd,
        ]
    );

    let err = elaborate_err(&Configuration::default(), &self::symbols(), "[`def x]");
    assert!(matches!(err, Error::EscapedArguments(ref name) if name == "def"));
}

#[test]
fn expansion_disabled() {
    let config = Configuration::default();
    let symbols = symbols();
    let events = Elaborator::new(&config, &symbols)
        .with_expansion(false)
        .elaborate("[pair x..y] VERSION")
        .unwrap();
    assert_eq!(
        events,
        [
            Event::Template {
                name: "pair".into(),
                escaped: false,
                arguments: vec!["x".into(), "y".into()],
            },
            text(" "),
            start(Style::Bold),
            text("1.0"),
            end(Style::Bold),
        ]
    );
}

#[test]
fn recursion_limit() {
    let config = Configuration::default().with_depth_limit(5);
    let mut symbols = symbols();
    symbols.define_macro("LOOP", "a LOOP");
    let err = elaborate_err(&config, &symbols, "LOOP");
    assert!(
        matches!(root_cause(&err), Error::RecursionLimit(name) if name == "LOOP"),
        "{err}"
    );
    assert!(err.to_string().contains("in 'LOOP'"));
}

#[test]
fn recursive_template_error_is_backtraced() {
    let config = Configuration::default();
    let mut symbols = symbols();
    symbols.define_template("outer", Vec::<String>::new(), "[pair a]");
    let err = elaborate_err(&config, &symbols, "[outer]");
    let Error::Expansion { name, err: inner } = &err else {
        panic!("unexpected {err}");
    };
    assert_eq!(name, "outer");
    assert!(matches!(**inner, Error::Arity { got: 1, .. }), "{err}");
}

#[test]
fn unicode_classes() {
    let config = Configuration::default().with_classes(CharClasses::Unicode);
    assert_eq!(
        elaborate_with(&config, &symbols(), "/\u{e9}t\u{e9}/"),
        [start(Style::Italic), text("\u{e9}t\u{e9}"), end(Style::Italic)]
    );
}

#[test]
fn break_arguments_stops_without_trailing_text() {
    let mut args = vec![("a ", false)];
    break_arguments(&mut args, 2, Dialect::Qbk15);
    assert_eq!(args, [("a ", false)]);

    let mut args = vec![("a b", true), ("c d e", true)];
    break_arguments(&mut args, 4, Dialect::Qbk14);
    assert_eq!(args, [("a b", true), ("c", true), ("d", false), ("e", false)]);

    let mut args = vec![("a b", false), ("c", false)];
    break_arguments(&mut args, 3, Dialect::Qbk15);
    assert_eq!(args, [("a b", false), ("c", false)]);
}
