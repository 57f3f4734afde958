//! PlanSQL Intermediate Representation
//!
//! The plan is the structured intent a planner (usually a language model) emits for
//! one user question. It is decoded leniently, validated against the catalog, and
//! lowered to SQL by `plansql-core`. All types round-trip through serde JSON.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use thiserror::Error;

mod types;
pub use types::*;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Invalid intent: {0} (expected \"aggregate\" or \"list_rows\")")]
    InvalidIntent(String),

    #[error("Malformed plan: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the plan asks for, and the fields that only make sense for that ask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    Aggregate {
        metric: Metric,
        #[serde(default, deserialize_with = "null_as_default")]
        group_by: Vec<ColumnRef>,
    },
    ListRows {
        #[serde(default, deserialize_with = "null_as_default")]
        select: Vec<ColumnRef>,
    },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Aggregate { .. } => "aggregate",
            Intent::ListRows { .. } => "list_rows",
        }
    }
}

/// Top-level query plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(flatten)]
    pub intent: Intent,

    #[serde(default, deserialize_with = "null_as_default")]
    pub filters: Vec<FilterEntry>,

    #[serde(default, deserialize_with = "lenient_time_filter")]
    pub time_filter: TimeFilter,

    #[serde(default, deserialize_with = "null_as_default")]
    pub joins: Vec<JoinEdge>,
}

impl Plan {
    pub fn aggregate(metric: Metric, group_by: Vec<ColumnRef>) -> Self {
        Self::with_intent(Intent::Aggregate { metric, group_by })
    }

    pub fn list_rows(select: Vec<ColumnRef>) -> Self {
        Self::with_intent(Intent::ListRows { select })
    }

    fn with_intent(intent: Intent) -> Self {
        Self {
            intent,
            filters: Vec::new(),
            time_filter: TimeFilter::None,
            joins: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: impl Into<FilterEntry>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn with_snapshot(
        mut self,
        table: impl Into<String>,
        snapshot_date_column: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        self.time_filter = TimeFilter::Snapshot(SnapshotFilter {
            date: date.into(),
            table: table.into(),
            snapshot_date_column: snapshot_date_column.into(),
        });
        self
    }

    pub fn with_join(mut self, join: JoinEdge) -> Self {
        self.joins.push(join);
        self
    }

    /// Decode planner output, rejecting unknown intents before shape checks
    pub fn from_json(text: &str) -> Result<Self, PlanError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, PlanError> {
        match value.get("intent") {
            Some(serde_json::Value::String(intent))
                if intent == "aggregate" || intent == "list_rows" => {}
            Some(serde_json::Value::String(intent)) => {
                return Err(PlanError::InvalidIntent(intent.clone()))
            }
            Some(other) => return Err(PlanError::InvalidIntent(other.to_string())),
            None => return Err(PlanError::InvalidIntent("<missing>".to_string())),
        }
        Ok(serde_json::from_value(value)?)
    }

    /// SHA-256 of the serialized plan, used to correlate audit records
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("plan should always serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// The table the statement selects FROM
    pub fn base_table(&self) -> Option<&str> {
        match &self.intent {
            Intent::Aggregate { metric, .. } => Some(metric.column.table.as_str()),
            Intent::ListRows { select } => select.first().map(|c| c.table.as_str()),
        }
    }

    pub fn snapshot(&self) -> Option<&SnapshotFilter> {
        self.time_filter.snapshot()
    }

    /// Filters that decoded cleanly; malformed entries are skipped
    pub fn valid_filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter_map(FilterEntry::as_filter)
    }

    /// Every (table, column) pair the plan reads, excluding join keys
    pub fn referenced_columns(&self) -> BTreeSet<ColumnRef> {
        let mut pairs = BTreeSet::new();

        match &self.intent {
            Intent::ListRows { select } => pairs.extend(select.iter().cloned()),
            Intent::Aggregate { metric, group_by } => {
                pairs.insert(metric.column.clone());
                pairs.extend(group_by.iter().cloned());
            }
        }

        if let Some(snapshot) = self.snapshot() {
            pairs.insert(snapshot.column_ref());
        }

        pairs.extend(self.valid_filters().map(Filter::column_ref));
        pairs
    }

    /// Tables touched by anything other than a join edge
    pub fn referenced_tables(&self) -> BTreeSet<&str> {
        let mut tables = BTreeSet::new();

        match &self.intent {
            Intent::ListRows { select } => tables.extend(select.iter().map(|c| c.table.as_str())),
            Intent::Aggregate { metric, group_by } => {
                tables.insert(metric.column.table.as_str());
                tables.extend(group_by.iter().map(|c| c.table.as_str()));
            }
        }

        if let Some(snapshot) = self.snapshot() {
            tables.insert(snapshot.table.as_str());
        }

        tables.extend(self.valid_filters().map(|f| f.table.as_str()));
        tables
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `null`, `{}` and objects without a `type` all mean "no time filter"
fn lenient_time_filter<'de, D>(deserializer: D) -> Result<TimeFilter, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(TimeFilter::None),
        Some(value) if value.get("type").is_none() => Ok(TimeFilter::None),
        Some(value) => TimeFilter::deserialize(value).map_err(de::Error::custom),
    }
}
