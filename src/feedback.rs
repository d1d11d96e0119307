//! Script filter output for the launcher.

use serde_json::{json, Value};

use crate::{Filtered, Item, MatchKey, Selection};

/// Command items may carry this in their title and subtitle to echo the query.
pub const PLACEHOLDER: &str = "{}";

/// Copy of the item with the first placeholder of `title` and `subtitle` replaced by `query`.
pub fn fill_placeholder(item: &Item, query: &str) -> Item {
    let mut item = item.clone();
    item.title = item.title.replacen(PLACEHOLDER, query, 1);

    if let Some(Value::String(subtitle)) = item.fields.get_mut("subtitle") {
        *subtitle = subtitle.replacen(PLACEHOLDER, query, 1);
    }

    item
}

/// Renders the filter result as `{"items": [...]}`.
pub fn script_filter_json(filtered: &Filtered<'_>) -> Value {
    let items: Vec<Value> = match &filtered.selection {
        Selection::Items(items) => items.iter().map(|item| launcher_item(item)).collect(),
        Selection::Commands(commands) => commands
            .iter()
            .map(|item| launcher_item(&fill_placeholder(item, &filtered.query)))
            .collect(),
    };

    json!({ "items": items })
}

fn launcher_item(item: &Item) -> Value {
    let mut object = item.fields.clone();
    object.insert("title".into(), Value::String(item.title.clone()));

    // the launcher only understands a single match string
    match &item.aliases {
        Some(MatchKey::One(alias)) => {
            object.insert("match".into(), Value::String(alias.clone()));
        }
        Some(MatchKey::Many(aliases)) => {
            object.insert("match".into(), Value::String(aliases.join(" ")));
        }
        None => {}
    }

    Value::Object(object)
}
