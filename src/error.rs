use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("`cmd_prefix` and `cmd_suffix` must not be set at the same time")]
    ConflictingDelimiters,

    #[error("either `cmd_prefix` or `cmd_suffix` must be set when command items are given")]
    MissingDelimiter,

    #[error("failed to launch matcher `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("i/o error while talking to the matcher: {0}")]
    Io(#[from] io::Error),

    #[error("matcher `{program}` failed with {}", exit_description(.code))]
    MatcherExit { program: String, code: Option<i32> },

    #[error("matcher output is not valid utf-8")]
    Utf8(#[from] FromUtf8Error),

    #[error("alias {alias:?} of item {item} spans several lines")]
    MultilineAlias { alias: String, item: usize },

    #[error("matcher returned a line that was never submitted: {0:?}")]
    UnknownCandidate(String),
}

impl FilterError {
    /// True for caller configuration mistakes, which are reported before any matcher runs.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConflictingDelimiters | Self::MissingDelimiter)
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "termination by signal".into(),
    }
}
