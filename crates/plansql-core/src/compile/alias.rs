//! Table alias bookkeeping for one compiled statement

use serde::Serialize;

/// Append-only table -> alias association in first-reference order.
///
/// The first table registered is the base table and gets `m`; every later
/// table gets `t1`, `t2`, ... Lookups never reorder or rename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AliasMap {
    entries: Vec<(String, String)>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias for `table`, assigning the next one on first sight
    pub fn alias(&mut self, table: &str) -> String {
        if let Some(alias) = self.get(table) {
            return alias.to_string();
        }

        let alias = match self.entries.len() {
            0 => "m".to_string(),
            n => format!("t{n}"),
        };
        self.entries.push((table.to_string(), alias.clone()));
        alias
    }

    /// `alias.column`
    pub fn qualify(&mut self, table: &str, column: &str) -> String {
        format!("{}.{}", self.alias(table), column)
    }

    pub fn get(&self, table: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == table)
            .map(|(_, alias)| alias.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, a)| (t.as_str(), a.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
