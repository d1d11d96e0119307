use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use cache::*;
pub use candidates::*;
pub use config::*;
pub use error::*;
pub use feedback::*;
pub use matchers::*;
pub use options::*;
pub use query::*;

mod cache;
mod candidates;
mod config;
mod error;
mod feedback;
mod matchers;
mod options;
mod query;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Shown by the launcher, and matched against when there is no `match` field.
    pub title: String,

    /// The alias (or aliases) the item is matched by.
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<MatchKey>,

    /// Every other field of the launcher item, passed through untouched.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Item {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            aliases: None,
            fields: Map::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases = Some(MatchKey::One(alias.into()));
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = Some(MatchKey::Many(aliases.into_iter().map(Into::into).collect()));
        self
    }

    /// The strings this item can be matched by, in declaration order.
    pub fn match_keys(&self) -> Vec<&str> {
        match &self.aliases {
            None => vec![self.title.as_str()],
            Some(MatchKey::One(alias)) => vec![alias.as_str()],
            Some(MatchKey::Many(aliases)) => aliases.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchKey {
    One(String),
    Many(Vec<String>),
}

pub trait Matcher {
    /// Filters the candidate lines with the query and returns the matching lines,
    /// ordered the way the matcher ranks them.
    ///
    /// Finding nothing is not an error and yields an empty list.
    fn filter(&self, query: &str, candidates: &[&str], exact: bool) -> Result<Vec<String>, FilterError>;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn match_field_is_one_or_many() {
        let one: Item = serde_json::from_value(json!({"title": "new blog", "match": "newblog"})).unwrap();
        let many: Item = serde_json::from_value(json!({"title": "a", "match": ["x", "y"]})).unwrap();
        let none: Item = serde_json::from_value(json!({"title": "my blog"})).unwrap();

        assert_eq!(one.match_keys(), vec!["newblog"]);
        assert_eq!(many.match_keys(), vec!["x", "y"]);
        assert_eq!(none.match_keys(), vec!["my blog"]);
    }

    #[test]
    fn unknown_fields_round_trip() {
        let value = json!({"title": "t", "subtitle": "s", "arg": 3, "mods": {"cmd": {"arg": "x"}}});

        let item: Item = serde_json::from_value(value.clone()).unwrap();

        assert_eq!(item.fields["arg"], json!(3));
        assert_eq!(serde_json::to_value(&item).unwrap(), value);
    }

    #[test]
    fn title_is_required() {
        assert!(serde_json::from_value::<Item>(json!({"match": "x"})).is_err());
    }
}
