use serde::{Deserialize, Serialize};

use crate::FilterError;

/// Per-call toggles of a filter request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Commands follow this delimiter, e.g. `hello :new`.
    pub cmd_prefix: Option<String>,

    /// Commands precede this delimiter, e.g. `new: hello`.
    pub cmd_suffix: Option<String>,

    /// Use the matcher's exact mode instead of fuzzy matching.
    pub exact: bool,

    /// Trim the search query before handing it to the matcher.
    pub strip_space_before_match: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            cmd_prefix: None,
            cmd_suffix: None,
            exact: false,
            strip_space_before_match: true,
        }
    }
}

impl FilterOptions {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            cmd_prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            cmd_suffix: Some(suffix.into()),
            ..Self::default()
        }
    }

    /// Returns the configured delimiter. Empty strings count as unset.
    pub fn delimiter(&self) -> Result<Option<Delimiter<'_>>, FilterError> {
        let prefix = self.cmd_prefix.as_deref().filter(|p| !p.is_empty());
        let suffix = self.cmd_suffix.as_deref().filter(|s| !s.is_empty());

        match (prefix, suffix) {
            (Some(_), Some(_)) => Err(FilterError::ConflictingDelimiters),
            (Some(prefix), None) => Ok(Some(Delimiter::Prefix(prefix))),
            (None, Some(suffix)) => Ok(Some(Delimiter::Suffix(suffix))),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delimiter<'a> {
    Prefix(&'a str),
    Suffix(&'a str),
}
