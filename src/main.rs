use quickbook_phrase::{
    elaborate::Elaborator,
    phrase::{CharClasses, Configuration, FileMap, Parser, Version, inspect},
    symbols::SymbolTable,
};
use std::io::Read as _;
use time::OffsetDateTime;

fn usage<T>(err: &'static str) -> anyhow::Result<T> {
    let exe = std::env::args().next().unwrap_or_default();
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("Usage: {exe} [options] <file.qbk | ->\n");
    println!("Options:");
    println!("    --version <major.minor>: Document version (default: 1.5)");
    println!("    --unicode: Use Unicode character classes");
    println!("    --preformatted: Do not end phrases at blank lines");
    println!("    --no-expand: Emit template invocations without expanding them");
    println!("    --tokens: Print the token tree instead of events");
    println!("    --json: Print events as JSON");
    println!("    -D <name[=value]>: Define a macro (repeatable)\n");
    Err(anyhow::Error::msg(err))
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        return usage("Help requested");
    }

    let version = args
        .opt_value_from_str::<_, Version>("--version")?
        .unwrap_or_default();
    let mut config = Configuration::new(version);
    if args.contains("--unicode") {
        config = config.with_classes(CharClasses::Unicode);
    }
    let preformatted = args.contains("--preformatted");
    let expand = !args.contains("--no-expand");
    let tokens = args.contains("--tokens");
    let json = args.contains("--json");
    let definitions = args.values_from_str::<_, String>("-D")?;
    let _ = args.contains("--");
    let Some(path) = args.opt_free_from_str::<String>()? else {
        return usage("Missing input file argument");
    };

    if !args.finish().is_empty() {
        return usage("Unknown extra arguments passed");
    }

    let source = if path == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        source
    } else {
        std::fs::read_to_string(&path)?
    };

    let mut symbols = SymbolTable::new();
    let now = OffsetDateTime::now_local().unwrap_or_else(|err| {
        log::debug!("local time unavailable: {err}");
        OffsetDateTime::now_utc()
    });
    symbols.define_builtins(&path, now)?;
    for definition in &definitions {
        symbols.define_command_line(&config, definition)?;
    }

    log::info!("Parsing {path} as QuickBook {version}");

    if tokens {
        let paragraphs = Parser::new(&config, &symbols)
            .with_preformatted(preformatted)
            .parse_paragraphs(&source)?;
        let file_map = FileMap::new(&source);
        for paragraph in &paragraphs {
            println!("{:#?}", inspect(&file_map, &paragraph.root));
        }
        return Ok(());
    }

    let paragraphs = Elaborator::new(&config, &symbols)
        .with_expansion(expand)
        .with_preformatted(preformatted)
        .elaborate_paragraphs(&source)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&paragraphs)?);
    } else {
        for events in &paragraphs {
            println!("{events:#?}");
        }
    }

    Ok(())
}
