use std::collections::HashMap;

use itertools::Itertools;
use log::debug;

use crate::{split_query, FilterError, FilterOptions, Item, Matcher, Mode};

/// Match strings of a list of items, each pointing back to the item it came from.
///
/// Aliases keep the position in which they were first inserted. When two items
/// share an alias, the later item owns it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Candidates {
    aliases: Vec<String>,
    owners: HashMap<String, usize>,
}

impl Candidates {
    /// Adds an alias for the item. Aliases are sent to the matcher one per line,
    /// so an alias containing a newline is rejected.
    pub fn insert(&mut self, alias: impl Into<String>, item_index: usize) -> Result<(), FilterError> {
        let alias = alias.into();

        if alias.contains('\n') {
            return Err(FilterError::MultilineAlias { alias, item: item_index });
        }

        match self.owners.get_mut(&alias) {
            Some(owner) => {
                debug!("alias {alias:?} moves from item {owner} to item {item_index}");
                *owner = item_index;
            }

            None => {
                self.owners.insert(alias.clone(), item_index);
                self.aliases.push(alias);
            }
        }

        Ok(())
    }

    /// The item index the alias points to.
    pub fn get(&self, alias: &str) -> Option<usize> {
        self.owners.get(alias).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.aliases
            .iter()
            .map(|alias| (alias.as_str(), self.owners[alias]))
    }

    pub fn aliases(&self) -> Vec<&str> {
        self.aliases.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Indexes every item under its `match` aliases, or its title if it has none.
pub fn build_candidates(items: &[Item]) -> Result<Candidates, FilterError> {
    let mut candidates = Candidates::default();

    for (index, item) in items.iter().enumerate() {
        for alias in item.match_keys() {
            candidates.insert(alias, index)?;
        }
    }

    Ok(candidates)
}

/// Runs the matcher over the candidates and returns the indices of the matching items.
///
/// Indices follow the matcher's order. An item matched through several aliases is
/// reported once, at the position of its first alias.
pub fn match_candidates(
    matcher: &dyn Matcher,
    query: &str,
    candidates: &Candidates,
    exact: bool,
) -> Result<Vec<usize>, FilterError> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let lines = matcher.filter(query, &candidates.aliases(), exact)?;
    debug!("{} of {} candidates match {query:?}", lines.len(), candidates.len());

    let indices = lines
        .into_iter()
        .map(|line| candidates.get(&line).ok_or(FilterError::UnknownCandidate(line)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(indices.into_iter().unique().collect())
}

/// Filters `items` with the query and returns the matching items in the matcher's order.
pub fn fzf_filter<'a>(
    matcher: &dyn Matcher,
    query: &str,
    items: &'a [Item],
    exact: bool,
) -> Result<Vec<&'a Item>, FilterError> {
    let candidates = build_candidates(items)?;

    let indices = match_candidates(matcher, query, &candidates, exact)?;
    Ok(indices.into_iter().map(|index| &items[index]).collect())
}

#[derive(Clone, Debug, PartialEq)]
pub enum Selection<'a> {
    /// Matches among the primary items.
    Items(Vec<&'a Item>),

    /// Matches among the command items.
    Commands(Vec<&'a Item>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filtered<'a> {
    /// The query to show the user, without metacharacters or the command part.
    pub query: String,
    pub selection: Selection<'a>,
}

impl<'a> Filtered<'a> {
    pub fn items(&self) -> Option<&[&'a Item]> {
        match &self.selection {
            Selection::Items(items) => Some(items.as_slice()),
            Selection::Commands(_) => None,
        }
    }

    pub fn commands(&self) -> Option<&[&'a Item]> {
        match &self.selection {
            Selection::Commands(commands) => Some(commands.as_slice()),
            Selection::Items(_) => None,
        }
    }
}

/// Splits the query and filters whichever item list it addresses.
///
/// Configuration errors are reported before the matcher is run.
pub fn filter_query<'a>(
    matcher: &dyn Matcher,
    query: &str,
    items: &'a [Item],
    cmd_items: Option<&'a [Item]>,
    options: &FilterOptions,
) -> Result<Filtered<'a>, FilterError> {
    let split = split_query(query, items, cmd_items, options)?;

    let selected = fzf_filter(matcher, &split.search, split.items, options.exact)?;

    let selection = match split.mode {
        Mode::Browse => Selection::Items(selected),
        Mode::Command => Selection::Commands(selected),
    };

    Ok(Filtered {
        query: split.display,
        selection,
    })
}
