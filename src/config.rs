use std::env;
use std::path::PathBuf;

use crate::FzfMatcher;

/// Path of the fzf binary. Launchers run workflows with a minimal `PATH`.
pub const FZF_ENV: &str = "ALFZF_FZF";

/// Extra whitespace separated arguments for fzf, e.g. `--tiebreak=begin`.
pub const FZF_OPTS_ENV: &str = "ALFZF_FZF_OPTS";

pub const DEFAULT_FZF: &str = "fzf";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatcherConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_FZF),
            args: Vec::new(),
        }
    }
}

impl MatcherConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|value: &String| !value.trim().is_empty());

        let program = lookup(FZF_ENV)
            .map(|value| PathBuf::from(value.trim()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FZF));

        let args = lookup(FZF_OPTS_ENV)
            .map(|value| value.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default();

        Self { program, args }
    }

    pub fn build(&self) -> FzfMatcher {
        FzfMatcher::new(&self.program).with_args(&self.args)
    }
}
