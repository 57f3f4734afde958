//! Query pipeline - plan in, guarded SQL out
//!
//! validate -> sanitize -> compile -> read-only guard -> limit injection, all
//! inside one tracing span keyed by a request id and the plan fingerprint.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use plansql_catalog::{CatalogEntry, CatalogIndex};
use plansql_ir::Plan;

use crate::compile::{CompileError, Compiler};
use crate::explain::explain;
use crate::guard::{has_limit, GuardViolation, SqlGuard};
use crate::sanitize::{sanitize_with_report, SanitizeReport};
use crate::used_columns::used_columns;
use crate::validate::{ValidationError, Validator};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Plan rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("Compilation failed: {0}")]
    Compile(#[from] CompileError),

    #[error("SQL rejected by guard: {0}")]
    Guard(#[from] GuardViolation),
}

/// Warnings attached to a statement that passed every check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFlag {
    /// A column marked PII in the catalog reaches the statement
    PiiColumnSelected,
    /// The statement carries no LIMIT
    NoLimit,
}

impl RiskFlag {
    pub fn assess(sql: &str, used_columns: &[CatalogEntry]) -> Vec<RiskFlag> {
        let mut flags = Vec::new();
        if used_columns.iter().any(|entry| entry.pii) {
            flags.push(RiskFlag::PiiColumnSelected);
        }
        if !has_limit(sql) {
            flags.push(RiskFlag::NoLimit);
        }
        flags
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskFlag::PiiColumnSelected => "PII_COLUMN_SELECTED",
            RiskFlag::NoLimit => "NO_LIMIT",
        }
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statement ready for execution plus what an auditor needs to know about it
#[derive(Debug, Clone, Serialize)]
pub struct PreparedQuery {
    pub request_id: Uuid,
    pub fingerprint: String,
    pub sql: String,
    pub explanation: String,
    pub used_columns: Vec<CatalogEntry>,
    pub dropped_filters: SanitizeReport,
    pub risk_flags: Vec<RiskFlag>,
    pub prepared_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct QueryPipeline {
    compiler: Compiler,
    guard: SqlGuard,
    reject_pii: bool,
}

impl QueryPipeline {
    pub fn new(compiler: Compiler, guard: SqlGuard) -> Self {
        Self {
            compiler,
            guard,
            reject_pii: false,
        }
    }

    pub fn with_pii_rejection(mut self, reject: bool) -> Self {
        self.reject_pii = reject;
        self
    }

    pub fn guard(&self) -> &SqlGuard {
        &self.guard
    }

    pub fn prepare(
        &self,
        plan: Plan,
        catalog: &CatalogIndex,
        candidates: &[CatalogEntry],
    ) -> Result<PreparedQuery, PipelineError> {
        let request_id = Uuid::new_v4();
        let fingerprint = plan.fingerprint();
        let span = tracing::info_span!(
            "prepare",
            %request_id,
            fingerprint = %&fingerprint[..12],
            intent = plan.intent.name()
        );
        let _enter = span.enter();

        Validator::new(catalog)
            .reject_pii(self.reject_pii)
            .validate(&plan)
            .map_err(|e| {
                tracing::warn!(error = %e, "Plan failed catalog validation");
                e
            })?;

        let (plan, dropped_filters) = sanitize_with_report(plan);
        let compiled = self.compiler.compile(&plan)?;

        self.guard
            .check_readonly(&compiled.sql)
            .map_err(|e| {
                tracing::error!(error = %e, "Compiled SQL rejected by read-only guard");
                e
            })?;
        let sql = self.guard.enforce_limit(&compiled.sql);

        let used_columns: Vec<CatalogEntry> = used_columns(&plan, catalog, candidates)
            .into_iter()
            .cloned()
            .collect();

        let risk_flags = RiskFlag::assess(&sql, &used_columns);
        if !risk_flags.is_empty() {
            tracing::warn!(?risk_flags, "Prepared query carries risk flags");
        }

        tracing::info!(tables = compiled.aliases.len(), "Prepared read-only query");

        Ok(PreparedQuery {
            request_id,
            fingerprint,
            sql,
            explanation: explain(&plan),
            used_columns,
            dropped_filters,
            risk_flags,
            prepared_at: Utc::now(),
        })
    }

    /// Write-path SQL comes from elsewhere and only passes through the guard
    pub fn check_write(&self, sql: &str) -> Result<(), PipelineError> {
        self.guard.check_write(sql).map_err(|e| {
            tracing::warn!(error = %e, "Write SQL rejected");
            PipelineError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_flags() {
        let mut national_id = CatalogEntry::new("CUST", "NATIONAL_ID");
        national_id.pii = true;
        let region = CatalogEntry::new("CUST", "REGION");

        assert_eq!(
            RiskFlag::assess("SELECT m.REGION AS REGION\nFROM CUST m\nLIMIT 1000;", &[region.clone()]),
            vec![]
        );
        assert_eq!(
            RiskFlag::assess("SELECT m.NATIONAL_ID FROM CUST m", &[region, national_id]),
            vec![RiskFlag::PiiColumnSelected, RiskFlag::NoLimit]
        );
        for flag in [RiskFlag::PiiColumnSelected, RiskFlag::NoLimit] {
            assert_eq!(serde_json::to_value(flag).unwrap(), serde_json::json!(flag.to_string()));
        }
    }
}
