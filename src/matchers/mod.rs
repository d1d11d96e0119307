pub use fuzzy::FuzzyMatcher;
pub use fzf::FzfMatcher;
pub use simple::SubstringMatcher;

mod fuzzy;
mod fzf;
mod pattern;
mod simple;
