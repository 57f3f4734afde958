//! Lenient field decoders for catalog rows.
//!
//! Catalog files are usually exported from spreadsheets, so flags arrive as
//! `"yes"`, `"1"` or `"evet"` and synonym lists as one delimited string.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

const TRUTHY: &[&str] = &["1", "true", "yes", "y", "evet"];

fn as_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(as_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        other => TRUTHY.contains(&as_text(other).to_lowercase().as_str()),
    })
}

pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(as_text(Value::deserialize(deserializer)?))
}

/// Accepts `["a", "b"]` or `"a|b;c,d"`
pub(crate) fn synonyms<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().map(as_text).collect::<Vec<_>>(),
        other => vec![as_text(other)],
    };

    Ok(raw
        .iter()
        .flat_map(|s| s.split(['|', ';', ',']))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}
