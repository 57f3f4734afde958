//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::fmt;
use std::io::Read;
use std::path::Path;

use plansql_core::catalog::{without_pii, CatalogEntry, CatalogIndex};
use plansql_core::ir::Plan;
use plansql_core::pipeline::PipelineError;

use crate::cli::PlanInput;

/// Error type representing a non-zero process exit code.
///
/// Commands return `Err(ExitCode(N).into())` when they already reported the
/// problem themselves.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// SQL refused by the guard
pub(crate) const EXIT_SQL_REJECTED: i32 = 1;
/// Plan refused while decoding or validating
pub(crate) const EXIT_PLAN_REJECTED: i32 = 2;

pub(crate) fn exit_code_for(err: &PipelineError) -> i32 {
    match err {
        PipelineError::Guard(_) => EXIT_SQL_REJECTED,
        PipelineError::Validation(_) | PipelineError::Compile(_) => EXIT_PLAN_REJECTED,
    }
}

/// Read a file, or stdin when `source` is "-"
pub(crate) fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))
}

pub(crate) fn load_plan(input: &PlanInput) -> Result<Plan> {
    let text = read_source(&input.plan)?;
    match Plan::from_json(&text) {
        Ok(plan) => Ok(plan),
        Err(e) => {
            eprintln!("error: invalid plan in {}: {e}", input.plan);
            Err(ExitCode(EXIT_PLAN_REJECTED).into())
        }
    }
}

pub(crate) fn load_catalog(path: &Path) -> Result<CatalogIndex> {
    let catalog = CatalogIndex::load(path)
        .with_context(|| format!("Failed to load catalog {}", path.display()))?;
    tracing::info!(columns = catalog.len(), path = %path.display(), "Catalog loaded");
    Ok(catalog)
}

pub(crate) fn load_candidates(path: Option<&Path>) -> Result<Vec<CatalogEntry>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read candidates {}", path.display()))?;
    let entries: Vec<CatalogEntry> = serde_json::from_str(&text)
        .with_context(|| format!("Invalid candidate entries in {}", path.display()))?;

    let shortlist = without_pii(&entries);
    if shortlist.len() < entries.len() {
        tracing::info!(
            dropped = entries.len() - shortlist.len(),
            "Dropped PII columns from candidate shortlist"
        );
    }
    Ok(shortlist)
}
