use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Deserialize;

use alfzf::{
    filter_query, script_filter_json, FilterOptions, FuzzyMatcher, Item, Matcher, MatcherConfig,
    SubstringMatcher,
};

/// Filters launcher items with a query, optionally switching to command items
/// when the query contains a command delimiter.
#[derive(Parser, Debug)]
#[command(name = "alfzf", version)]
struct Cli {
    /// The query typed into the launcher.
    #[arg(default_value = "")]
    query: String,

    /// JSON file with the items to browse, `-` for stdin.
    #[arg(long, value_name = "FILE")]
    items: PathBuf,

    /// JSON file with the command items.
    #[arg(long, value_name = "FILE")]
    commands: Option<PathBuf>,

    /// Commands follow this delimiter.
    #[arg(long, value_name = "DELIM", conflicts_with = "suffix")]
    prefix: Option<String>,

    /// Commands precede this delimiter.
    #[arg(long, value_name = "DELIM")]
    suffix: Option<String>,

    /// Match exactly instead of fuzzily.
    #[arg(long)]
    exact: bool,

    /// Do not trim the search query before matching.
    #[arg(long)]
    keep_space: bool,

    #[arg(long, value_enum, default_value_t = MatcherKind::Fzf)]
    matcher: MatcherKind,

    /// Path to the fzf binary, overrides ALFZF_FZF.
    #[arg(long, value_name = "PATH")]
    fzf: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MatcherKind {
    /// Run fzf in filter mode.
    Fzf,
    /// Built-in matcher understanding fzf's search syntax.
    Fuzzy,
    /// Plain word-substring matching.
    Substring,
}

/// Either a bare list of items or a whole script filter document.
#[derive(Deserialize)]
#[serde(untagged)]
enum ItemFile {
    List(Vec<Item>),
    ScriptFilter { items: Vec<Item> },
}

fn load_items(path: &Path) -> Result<Vec<Item>> {
    let file: ItemFile = if path == Path::new("-") {
        serde_json::from_reader(BufReader::new(io::stdin().lock()))
    } else {
        let fp = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(fp))
    }
    .with_context(|| format!("failed to parse items from {}", path.display()))?;

    Ok(match file {
        ItemFile::List(items) => items,
        ItemFile::ScriptFilter { items } => items,
    })
}

fn build_matcher(kind: MatcherKind, fzf: Option<PathBuf>) -> Box<dyn Matcher> {
    match kind {
        MatcherKind::Fzf => {
            let mut config = MatcherConfig::from_env();
            if let Some(program) = fzf {
                config.program = program;
            }

            Box::new(config.build())
        }

        MatcherKind::Fuzzy => Box::new(FuzzyMatcher::skim()),
        MatcherKind::Substring => Box::new(SubstringMatcher),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let items = load_items(&cli.items)?;
    let commands = cli.commands.as_deref().map(load_items).transpose()?;

    let matcher = build_matcher(cli.matcher, cli.fzf);
    let options = FilterOptions {
        cmd_prefix: cli.prefix,
        cmd_suffix: cli.suffix,
        exact: cli.exact,
        strip_space_before_match: !cli.keep_space,
    };

    let filtered = filter_query(matcher.as_ref(), &cli.query, &items, commands.as_deref(), &options)
        .with_context(|| format!("failed to filter items for {:?}", cli.query))?;

    let mut writer = BufWriter::new(io::stdout().lock());
    serde_json::to_writer(&mut writer, &script_filter_json(&filtered))?;
    writeln!(writer)?;
    writer.flush()?;

    Ok(())
}
