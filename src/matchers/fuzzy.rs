use fuzzy_matcher::skim::SkimMatcherV2;
use itertools::Itertools;

use crate::matchers::pattern::Pattern;
use crate::{FilterError, Matcher};

/// In-process stand-in for fzf, scoring fuzzy terms with a `fuzzy_matcher` algorithm.
pub struct FuzzyMatcher<T>(T);

impl<T> FuzzyMatcher<T> {
    pub fn new(matcher: T) -> Self {
        Self(matcher)
    }
}

impl FuzzyMatcher<SkimMatcherV2> {
    /// The skim algorithm with fzf's smart case behaviour.
    pub fn skim() -> Self {
        Self(SkimMatcherV2::default().smart_case())
    }
}

impl<T> Matcher for FuzzyMatcher<T>
    where T: fuzzy_matcher::FuzzyMatcher,
{
    fn filter(&self, query: &str, candidates: &[&str], exact: bool) -> Result<Vec<String>, FilterError> {
        let pattern = Pattern::parse(query, exact);

        if pattern.is_empty() {
            return Ok(candidates.iter().map(|line| line.to_string()).collect());
        }

        // sorting is stable, equal scores keep their input order
        Ok(candidates.iter()
            .flat_map(|line| {
                pattern
                    .score(&self.0, line)
                    .map(|score| (score, line))
            })
            .sorted_by_key(|(score, _line)| -score)
            .map(|(_score, line)| line.to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_query_keeps_everything_in_order() {
        let found = FuzzyMatcher::skim().filter("", &["b", "a", ""], false).unwrap();

        assert_eq!(found, vec!["b", "a", ""]);
    }

    #[test]
    fn duplicate_lines_are_all_returned() {
        let found = FuzzyMatcher::skim().filter("x", &["x", "x"], false).unwrap();

        assert_eq!(found, vec!["x", "x"]);
    }

    #[test]
    fn no_match_is_empty() {
        let found = FuzzyMatcher::skim().filter("zzz", &["newblog", "editblog"], false).unwrap();

        assert!(found.is_empty());
    }

    #[test]
    fn better_matches_rank_first() {
        let found = FuzzyMatcher::skim()
            .filter("blog", &["b-l-o-g", "blog", "xx"], false)
            .unwrap();

        assert_eq!(found, vec!["blog", "b-l-o-g"]);
    }

    #[test]
    fn exact_mode_needs_substrings() {
        let found = FuzzyMatcher::skim().filter("x1", &["x1", "x-1", "ax1b"], true).unwrap();

        assert_eq!(found, vec!["x1", "ax1b"]);
    }
}
