//! Catalog index - the whitelist of queryable tables and columns
//!
//! Built once by an ingestion step (CSV export, INFORMATION_SCHEMA crawl, ...) and
//! then shared read-only by the validator, the compiler pipeline and the
//! used-columns projector.

mod de;

use plansql_ir::{ColumnRef, JoinEdge};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate catalog column: {table}.{column}")]
    Duplicate { table: String, column: String },

    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Metadata for one (table, column) pair
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    #[serde(deserialize_with = "de::text")]
    pub table_name: String,
    #[serde(deserialize_with = "de::text")]
    pub column_name: String,
    #[serde(deserialize_with = "de::text")]
    pub data_type: String,
    #[serde(deserialize_with = "de::text")]
    pub description: String,
    #[serde(deserialize_with = "de::flag")]
    pub pii: bool,
    #[serde(deserialize_with = "de::synonyms")]
    pub synonyms: Vec<String>,
    #[serde(deserialize_with = "de::flag")]
    pub is_primary_key: bool,
    #[serde(deserialize_with = "de::flag")]
    pub is_foreign_key: bool,
    #[serde(deserialize_with = "de::text")]
    pub references_table: String,
    #[serde(deserialize_with = "de::text")]
    pub references_column: String,
    #[serde(deserialize_with = "de::text")]
    pub semantic_role: String,
    #[serde(deserialize_with = "de::text")]
    pub recommended_aggregation: String,
    #[serde(deserialize_with = "de::flag")]
    pub is_snapshot_table: bool,
    #[serde(deserialize_with = "de::text")]
    pub snapshot_date_column: String,
    #[serde(deserialize_with = "de::text")]
    pub data_classification: String,
    #[serde(deserialize_with = "de::text")]
    pub example_values: String,
}

impl CatalogEntry {
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            ..Default::default()
        }
    }

    pub fn column_ref(&self) -> ColumnRef {
        ColumnRef::new(&self.table_name, &self.column_name)
    }

    /// Foreign-key edge declared by this column, if complete
    pub fn foreign_key(&self) -> Option<JoinEdge> {
        (self.is_foreign_key && !self.references_table.is_empty() && !self.references_column.is_empty())
            .then(|| {
                JoinEdge::new(
                    &self.table_name,
                    &self.column_name,
                    &self.references_table,
                    &self.references_column,
                )
            })
    }
}

/// Table-level facts derived from its columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub is_snapshot_table: bool,
    pub snapshot_date_column: Option<String>,
}

impl TableInfo {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            is_snapshot_table: false,
            snapshot_date_column: None,
        }
    }

    fn absorb(&mut self, entry: &CatalogEntry) {
        self.columns.push(entry.column_name.clone());
        if entry.is_snapshot_table {
            self.is_snapshot_table = true;
            if !entry.snapshot_date_column.is_empty() {
                self.snapshot_date_column = Some(entry.snapshot_date_column.clone());
            }
        }
    }
}

/// Immutable (table, column) -> metadata index
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<CatalogEntry>,
    positions: HashMap<ColumnRef, usize>,
    tables: BTreeMap<String, TableInfo>,
    fk_edges: Vec<JoinEdge>,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index, skipping rows without a table or column name
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self, CatalogError> {
        let mut index = Self::new();
        let mut skipped = 0usize;

        for entry in entries {
            if entry.table_name.is_empty() || entry.column_name.is_empty() {
                skipped += 1;
                continue;
            }
            index.register(entry)?;
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Skipped catalog rows without table or column name");
        }
        tracing::debug!(
            columns = index.len(),
            tables = index.tables.len(),
            fk_edges = index.fk_edges.len(),
            "Catalog index built"
        );

        Ok(index)
    }

    /// Parse a JSON array of catalog rows
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    fn register(&mut self, entry: CatalogEntry) -> Result<(), CatalogError> {
        let key = entry.column_ref();
        if self.positions.contains_key(&key) {
            return Err(CatalogError::Duplicate {
                table: key.table,
                column: key.column,
            });
        }

        self.tables
            .entry(entry.table_name.clone())
            .or_insert_with(|| TableInfo::new(&entry.table_name))
            .absorb(&entry);

        if let Some(edge) = entry.foreign_key() {
            self.fk_edges.push(edge);
        }

        self.positions.insert(key, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, table: &str, column: &str) -> Option<&CatalogEntry> {
        self.get_ref(&ColumnRef::new(table, column))
    }

    pub fn get_ref(&self, column: &ColumnRef) -> Option<&CatalogEntry> {
        self.positions.get(column).map(|&i| &self.entries[i])
    }

    /// Tables ordered by name
    pub fn tables(&self) -> impl Iterator<Item = &TableInfo> {
        self.tables.values()
    }

    /// Entries in ingestion order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn fk_edges(&self) -> &[JoinEdge] {
        &self.fk_edges
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drop PII-flagged columns from a candidate shortlist before it reaches a planner
pub fn without_pii(entries: &[CatalogEntry]) -> Vec<CatalogEntry> {
    entries.iter().filter(|e| !e.pii).cloned().collect()
}
