//! Validation layer for plans
//!
//! Checks every column reference in a plan against a whitelist of catalog entries
//! (the full catalog or the candidate shortlist the planner was shown). Join edges
//! are checked at table granularity only. The first violation aborts validation.

use std::collections::HashSet;
use thiserror::Error;

use plansql_catalog::{CatalogEntry, CatalogIndex};
use plansql_ir::{ColumnRef, FilterEntry, Intent, Plan};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Plan uses unknown column: {table}.{column}")]
    UnknownColumn { table: String, column: String },

    #[error("Join uses unknown table: {table}")]
    UnknownTable { table: String },

    #[error("list_rows intent requires a non-empty select list")]
    EmptySelect,

    #[error("Plan projects PII column: {table}.{column}")]
    PiiColumn { table: String, column: String },

    #[error("Unsupported filter operator {op:?} on {table}.{column}")]
    UnsupportedOperator {
        table: String,
        column: String,
        op: String,
    },
}

impl ValidationError {
    fn unknown(column: &ColumnRef) -> Self {
        ValidationError::UnknownColumn {
            table: column.table.clone(),
            column: column.column.clone(),
        }
    }
}

pub struct Validator {
    allowed: HashSet<ColumnRef>,
    tables: HashSet<String>,
    pii: HashSet<ColumnRef>,
    reject_pii: bool,
}

impl Validator {
    pub fn new(catalog: &CatalogIndex) -> Self {
        Self::from_entries(catalog.entries())
    }

    /// Validate against an explicit shortlist instead of the whole catalog
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a CatalogEntry>) -> Self {
        let mut allowed = HashSet::new();
        let mut tables = HashSet::new();
        let mut pii = HashSet::new();

        for entry in entries {
            let key = entry.column_ref();
            if entry.pii {
                pii.insert(key.clone());
            }
            tables.insert(key.table.clone());
            allowed.insert(key);
        }

        Self {
            allowed,
            tables,
            pii,
            reject_pii: false,
        }
    }

    /// Also refuse plans that select, group by or aggregate a PII column
    pub fn reject_pii(mut self, reject: bool) -> Self {
        self.reject_pii = reject;
        self
    }

    pub fn validate(&self, plan: &Plan) -> Result<(), ValidationError> {
        match &plan.intent {
            Intent::Aggregate { metric, .. } => self.check_projected(&metric.column)?,
            Intent::ListRows { select } => {
                if select.is_empty() {
                    return Err(ValidationError::EmptySelect);
                }
                for column in select {
                    self.check_projected(column)?;
                }
            }
        }

        for entry in &plan.filters {
            match entry {
                FilterEntry::Valid(filter) => self.check_column(&filter.column_ref())?,
                FilterEntry::Unsupported(raw) => {
                    return Err(ValidationError::UnsupportedOperator {
                        table: raw.table.clone(),
                        column: raw.column.clone(),
                        op: raw.op.clone(),
                    });
                }
                FilterEntry::Malformed(_) => {}
            }
        }

        if let Intent::Aggregate { group_by, .. } = &plan.intent {
            for column in group_by {
                self.check_projected(column)?;
            }
        }

        if let Some(snapshot) = plan.snapshot() {
            self.check_column(&snapshot.column_ref())?;
        }

        for join in &plan.joins {
            for table in [&join.from_table, &join.to_table] {
                if !self.tables.contains(table) {
                    return Err(ValidationError::UnknownTable {
                        table: table.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    fn check_column(&self, column: &ColumnRef) -> Result<(), ValidationError> {
        if self.allowed.contains(column) {
            Ok(())
        } else {
            Err(ValidationError::unknown(column))
        }
    }

    fn check_projected(&self, column: &ColumnRef) -> Result<(), ValidationError> {
        self.check_column(column)?;
        if self.reject_pii && self.pii.contains(column) {
            return Err(ValidationError::PiiColumn {
                table: column.table.clone(),
                column: column.column.clone(),
            });
        }
        Ok(())
    }
}
