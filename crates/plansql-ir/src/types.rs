//! Leaf types shared by every plan shape

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fully qualified column reference
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// True when this reference names the given (table, column) pair
    pub fn is(&self, table: &str, column: &str) -> bool {
        self.table == table && self.column == column
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Aggregate function requested by the planner.
///
/// Anything outside `count`/`sum`/`avg` is kept as `Other` so that decoding never
/// fails on a novel name; the compiler treats it as a distinct count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MetricKind {
    Count,
    Sum,
    Avg,
    Other(String),
}

impl From<String> for MetricKind {
    fn from(name: String) -> Self {
        match name.trim().to_lowercase().as_str() {
            "count" => MetricKind::Count,
            "sum" => MetricKind::Sum,
            "avg" => MetricKind::Avg,
            _ => MetricKind::Other(name),
        }
    }
}

impl From<MetricKind> for String {
    fn from(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Count => "count".to_string(),
            MetricKind::Sum => "sum".to_string(),
            MetricKind::Avg => "avg".to_string(),
            MetricKind::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    #[serde(rename = "type")]
    pub kind: MetricKind,
    #[serde(default, deserialize_with = "crate::null_as_default")]
    pub distinct: bool,
    pub column: ColumnRef,
}

/// Comparison operators a filter may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
}

impl FilterOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "<>",
            FilterOp::Lt => "<",
            FilterOp::Le => "<=",
            FilterOp::Gt => ">",
            FilterOp::Ge => ">=",
            FilterOp::Like => "LIKE",
            FilterOp::NotLike => "NOT LIKE",
        }
    }
}

impl TryFrom<String> for FilterOp {
    type Error = String;

    fn try_from(op: String) -> Result<Self, Self::Error> {
        let normalized = op.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
        match normalized.as_str() {
            "=" | "==" => Ok(FilterOp::Eq),
            "!=" | "<>" => Ok(FilterOp::Ne),
            "<" => Ok(FilterOp::Lt),
            "<=" => Ok(FilterOp::Le),
            ">" => Ok(FilterOp::Gt),
            ">=" => Ok(FilterOp::Ge),
            "like" => Ok(FilterOp::Like),
            "not like" => Ok(FilterOp::NotLike),
            _ => Err(format!("unsupported filter operator: {op:?}")),
        }
    }
}

impl From<FilterOp> for String {
    fn from(op: FilterOp) -> Self {
        op.as_sql().to_string()
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A well-formed WHERE predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub table: String,
    pub column: String,
    pub op: FilterOp,
    /// Literal compared against; `null` is allowed but the key must be present
    pub value: serde_json::Value,
}

impl Filter {
    pub fn column_ref(&self) -> ColumnRef {
        ColumnRef::new(&self.table, &self.column)
    }

    pub fn targets(&self, table: &str, column: &str) -> bool {
        self.table == table && self.column == column
    }
}

/// A filter with the right shape whose operator is outside [`FilterOp`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsupportedFilter {
    pub table: String,
    pub column: String,
    pub op: String,
    pub value: serde_json::Value,
}

/// One entry of a plan's `filters` list as received from the planner.
///
/// Planner output is untrusted, so entries that do not decode as a [`Filter`]
/// are kept verbatim instead of failing the whole plan. The validator refuses
/// [`FilterEntry::Unsupported`] (dropping it would widen the result set); the
/// sanitizer drops [`FilterEntry::Malformed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterEntry {
    Valid(Filter),
    Unsupported(UnsupportedFilter),
    Malformed(serde_json::Value),
}

impl FilterEntry {
    pub fn as_filter(&self) -> Option<&Filter> {
        match self {
            FilterEntry::Valid(filter) => Some(filter),
            FilterEntry::Unsupported(_) | FilterEntry::Malformed(_) => None,
        }
    }
}

impl From<Filter> for FilterEntry {
    fn from(filter: Filter) -> Self {
        FilterEntry::Valid(filter)
    }
}

/// Point-in-time predicate on a snapshot table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotFilter {
    pub date: String,
    pub table: String,
    pub snapshot_date_column: String,
}

impl SnapshotFilter {
    pub fn column_ref(&self) -> ColumnRef {
        ColumnRef::new(&self.table, &self.snapshot_date_column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeFilter {
    Snapshot(SnapshotFilter),
    /// `"none"` and any unrecognised type
    #[default]
    #[serde(other)]
    None,
}

impl TimeFilter {
    pub fn snapshot(&self) -> Option<&SnapshotFilter> {
        match self {
            TimeFilter::Snapshot(snapshot) => Some(snapshot),
            TimeFilter::None => None,
        }
    }
}

/// Join between two catalog tables
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinEdge {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

impl JoinEdge {
    pub fn new(
        from_table: impl Into<String>,
        from_column: impl Into<String>,
        to_table: impl Into<String>,
        to_column: impl Into<String>,
    ) -> Self {
        Self {
            from_table: from_table.into(),
            from_column: from_column.into(),
            to_table: to_table.into(),
            to_column: to_column.into(),
        }
    }
}
