//! fzf's extended search syntax.
//!
//! Terms are separated by spaces and must all match. Terms joined by a lone `|`
//! form a group of which any one has to match. Per term:
//!
//! | term     | meaning                                   |
//! |----------|-------------------------------------------|
//! | `sbtrkt` | fuzzy match (substring in exact mode)     |
//! | `'wild`  | substring (fuzzy in exact mode)           |
//! | `^music` | prefix                                    |
//! | `.mp3$`  | suffix                                    |
//! | `^a$`    | whole line                                |
//! | `!fire`  | must not contain                          |
//!
//! Lowercase terms match case-insensitively, terms with an uppercase letter match
//! case-sensitively. `\ ` is a literal space.

use fuzzy_matcher::FuzzyMatcher;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TermKind {
    Fuzzy,
    Exact(Anchor),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Anchor {
    Anywhere,
    Start,
    End,
    Both,
}

impl Anchor {
    fn matches(self, line: &str, text: &str) -> bool {
        match self {
            Self::Anywhere => line.contains(text),
            Self::Start => line.starts_with(text),
            Self::End => line.ends_with(text),
            Self::Both => line == text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Term {
    kind: TermKind,
    text: String,
    negated: bool,
    case_sensitive: bool,
}

impl Term {
    fn parse(token: &str, exact: bool) -> Option<Self> {
        let (negated, token) = match token.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, token),
        };

        let (anchored_end, token) = match token.strip_suffix('$') {
            Some(rest) => (true, rest),
            None => (false, token),
        };

        let (kind, text) = if let Some(rest) = token.strip_prefix('\'') {
            let kind = if exact { TermKind::Fuzzy } else { TermKind::Exact(Anchor::Anywhere) };
            (kind, rest)
        } else if let Some(rest) = token.strip_prefix('^') {
            let anchor = if anchored_end { Anchor::Both } else { Anchor::Start };
            (TermKind::Exact(anchor), rest)
        } else if anchored_end {
            (TermKind::Exact(Anchor::End), token)
        } else if exact {
            (TermKind::Exact(Anchor::Anywhere), token)
        } else {
            (TermKind::Fuzzy, token)
        };

        if text.is_empty() {
            return None;
        }

        // fzf has no inverse fuzzy match, `!term` is always exact
        let kind = match kind {
            TermKind::Fuzzy if negated => TermKind::Exact(Anchor::Anywhere),
            kind => kind,
        };

        Some(Self {
            kind,
            case_sensitive: is_case_sensitive(text),
            text: text.to_owned(),
            negated,
        })
    }

    fn score<M: FuzzyMatcher + ?Sized>(&self, matcher: &M, line: &str) -> Option<i64> {
        let score = match self.kind {
            TermKind::Fuzzy => matcher.fuzzy_match(line, &self.text),

            TermKind::Exact(anchor) if self.case_sensitive => {
                anchor.matches(line, &self.text).then(|| self.text.len() as i64)
            }

            TermKind::Exact(anchor) => {
                let text = self.text.to_lowercase();
                anchor.matches(&line.to_lowercase(), &text).then(|| text.len() as i64)
            }
        };

        match (score, self.negated) {
            (Some(score), false) => Some(score),
            (None, true) => Some(0),
            _ => None,
        }
    }
}

/// A parsed query: every group has to match, a group matches when any of its terms does.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pattern {
    groups: Vec<Vec<Term>>,
}

impl Pattern {
    pub fn parse(query: &str, exact: bool) -> Self {
        let mut groups: Vec<Vec<Term>> = Vec::new();
        let mut join_next = false;

        for token in tokenize(query) {
            if token == "|" {
                join_next = !groups.is_empty();
                continue;
            }

            let Some(term) = Term::parse(&token, exact) else {
                continue;
            };

            match groups.last_mut() {
                Some(group) if join_next => group.push(term),
                _ => groups.push(vec![term]),
            }

            join_next = false;
        }

        Self { groups }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Scores the line, or returns `None` if it does not match.
    pub fn score<M: FuzzyMatcher + ?Sized>(&self, matcher: &M, line: &str) -> Option<i64> {
        self.groups.iter().try_fold(0, |total, group| {
            let best = group
                .iter()
                .filter_map(|term| term.score(matcher, line))
                .max()?;

            Some(total + best)
        })
    }
}

/// Splits on unescaped whitespace, turning `\ ` into a literal space.
fn tokenize(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = query.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&' ') {
            current.push(' ');
            chars.next();
        } else if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

/// Smart case: only a query containing uppercase letters is matched case-sensitively.
pub(crate) fn is_case_sensitive(text: &str) -> bool {
    text.chars().any(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use fuzzy_matcher::skim::SkimMatcherV2;

    use super::*;

    fn matches(query: &str, exact: bool, line: &str) -> bool {
        let matcher = SkimMatcherV2::default().smart_case();
        Pattern::parse(query, exact).score(&matcher, line).is_some()
    }

    #[test]
    fn tokenizes_escaped_spaces() {
        assert_eq!(tokenize(r"a\ b  c"), vec!["a b", "c"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn parses_term_kinds() {
        let pattern = Pattern::parse("fz 'sub ^pre suf$ ^eq$ !not", false);
        let kinds: Vec<_> = pattern.groups.iter().map(|g| (g[0].kind, g[0].negated)).collect();

        assert_eq!(
            kinds,
            vec![
                (TermKind::Fuzzy, false),
                (TermKind::Exact(Anchor::Anywhere), false),
                (TermKind::Exact(Anchor::Start), false),
                (TermKind::Exact(Anchor::End), false),
                (TermKind::Exact(Anchor::Both), false),
                (TermKind::Exact(Anchor::Anywhere), true),
            ]
        );
    }

    #[test]
    fn exact_mode_flips_quote() {
        let pattern = Pattern::parse("plain 'fuzzy", true);
        let kinds: Vec<_> = pattern.groups.iter().map(|g| g[0].kind).collect();

        assert_eq!(kinds, vec![TermKind::Exact(Anchor::Anywhere), TermKind::Fuzzy]);
    }

    #[test]
    fn bare_metacharacters_are_ignored() {
        assert!(Pattern::parse("^ ! ' $", false).is_empty());
        assert!(Pattern::parse("| a", false).groups.len() == 1);
    }

    #[test]
    fn anchors_and_negation() {
        assert!(matches("^new", false, "newblog"));
        assert!(!matches("^new", false, "editblog"));
        assert!(matches("blog$", false, "newblog"));
        assert!(matches("^newblog$", false, "newblog"));
        assert!(!matches("^new$", false, "newblog"));
        assert!(matches("!edit", false, "newblog"));
        assert!(!matches("!edit", false, "editblog"));
    }

    #[test]
    fn or_groups() {
        assert!(matches("^edit | ^new", false, "newblog"));
        assert!(matches("^edit | ^new", false, "editblog"));
        assert!(!matches("^edit | ^new blog$", false, "newpost"));
    }

    #[test]
    fn fuzzy_versus_exact() {
        assert!(matches("nbg", false, "newblog"));
        assert!(!matches("nbg", true, "newblog"));
        assert!(matches("wbl", true, "newblog"));
    }

    #[test]
    fn smart_case() {
        assert!(matches("'Blog", false, "New Blog"));
        assert!(!matches("'Blog", false, "new blog"));
        assert!(matches("'blog", false, "New Blog"));
    }
}
