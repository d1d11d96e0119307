use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::{Delimiter, FilterError, FilterOptions, Item};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// The query is matched against the primary items.
    Browse,

    /// A delimiter was found; the part behind it is matched against the command items.
    Command,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SplitQuery<'a> {
    /// Query text to echo back to the user, without matcher metacharacters.
    pub display: String,

    /// Query text to hand to the matcher.
    pub search: String,

    pub mode: Mode,

    /// The item list the search query applies to.
    pub items: &'a [Item],
}

impl SplitQuery<'_> {
    pub fn is_browse(&self) -> bool {
        self.mode == Mode::Browse
    }
}

/// Splits the raw query into the query to display and the query to search with,
/// and decides whether the user is browsing `items` or picking one of `cmd_items`.
///
/// A prefix delimiter splits at its first occurrence, a suffix delimiter at its last.
/// If the delimiter does not occur, or there are no command items, the whole
/// query browses `items`.
pub fn split_query<'a>(
    query: &str,
    items: &'a [Item],
    cmd_items: Option<&'a [Item]>,
    options: &FilterOptions,
) -> Result<SplitQuery<'a>, FilterError> {
    let delimiter = options.delimiter()?;

    if let Some(cmd_items) = cmd_items.filter(|cmd_items| !cmd_items.is_empty()) {
        let delimiter = delimiter.ok_or(FilterError::MissingDelimiter)?;

        if let Some((display, search)) = split_at_delimiter(query, delimiter) {
            debug!("command mode, delimiter {delimiter:?} found in {query:?}");

            return Ok(SplitQuery {
                display: sanitize_query(display.trim()),
                search: search_text(search, options),
                mode: Mode::Command,
                items: cmd_items,
            });
        }
    }

    Ok(SplitQuery {
        display: sanitize_query(query.trim()),
        search: search_text(query, options),
        mode: Mode::Browse,
        items,
    })
}

/// Returns `(display, search)` around the delimiter, if present.
fn split_at_delimiter<'q>(query: &'q str, delimiter: Delimiter<'_>) -> Option<(&'q str, &'q str)> {
    match delimiter {
        Delimiter::Prefix(prefix) => query.split_once(prefix),
        Delimiter::Suffix(suffix) => query
            .rsplit_once(suffix)
            .map(|(before, after)| (after, before)),
    }
}

fn search_text(text: &str, options: &FilterOptions) -> String {
    if options.strip_space_before_match {
        text.trim().to_owned()
    } else {
        text.to_owned()
    }
}

struct MetacharRules {
    leading_quote: Regex,
    leading_caret: Regex,
    trailing_dollar: Regex,
    leading_bang: Regex,
    spaces: Regex,
}

fn rules() -> &'static MetacharRules {
    static RULES: OnceLock<MetacharRules> = OnceLock::new();

    RULES.get_or_init(|| MetacharRules {
        leading_quote: Regex::new(r"(^|\s)'").expect("valid regex"),
        leading_caret: Regex::new(r"(^|\s)\^").expect("valid regex"),
        trailing_dollar: Regex::new(r"\$($|\s)").expect("valid regex"),
        leading_bang: Regex::new(r"(^|\s)!").expect("valid regex"),
        spaces: Regex::new(r" +").expect("valid regex"),
    })
}

/// Removes fzf search metacharacters so the query can be shown back to the user.
///
/// Strips `'`, `^` and `!` at the start of a word, `$` at the end of a word and
/// every `|`, unescapes `\ `, collapses repeated spaces and trims the result.
/// Sanitizing an already sanitized query leaves it unchanged.
pub fn sanitize_query(query: &str) -> String {
    let mut current = sanitize_once(query);

    // every rule only ever shortens the text, so this reaches a fixpoint
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }

        current = next;
    }
}

fn sanitize_once(query: &str) -> String {
    let rules = rules();

    let query = rules.leading_quote.replace_all(query, "${1}");
    let query = rules.leading_caret.replace_all(&query, "${1}");
    let query = rules.trailing_dollar.replace_all(&query, "${1}");
    let query = rules.leading_bang.replace_all(&query, "${1}");
    let query = query.replace('|', "").replace(r"\ ", " ");
    let query = rules.spaces.replace_all(&query, " ");

    query.trim().to_owned()
}
