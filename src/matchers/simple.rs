use itertools::Itertools;

use crate::matchers::pattern::is_case_sensitive;
use crate::{FilterError, Matcher};

/// Keeps lines containing every word of the query, in their original order.
///
/// Knows nothing about fzf's search syntax and ignores the exact flag.
pub struct SubstringMatcher;

impl Matcher for SubstringMatcher {
    fn filter(&self, query: &str, candidates: &[&str], _exact: bool) -> Result<Vec<String>, FilterError> {
        let case_sensitive = is_case_sensitive(query);

        let query = fold_case(query, case_sensitive);
        let query_parts = query.split_whitespace().collect_vec();

        Ok(candidates.iter()
            .filter(|line| {
                let haystack = fold_case(line, case_sensitive);
                query_parts
                    .iter()
                    .all(|part| haystack.contains(part))
            })
            .map(|line| line.to_string())
            .collect())
    }
}

fn fold_case(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_owned()
    } else {
        text.to_lowercase()
    }
}
