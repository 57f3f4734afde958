//! Catalog command implementation

use anyhow::Result;
use serde::Serialize;

use plansql_core::catalog::{CatalogIndex, TableInfo};
use plansql_core::ir::JoinEdge;

use crate::cli::CatalogArgs;
use crate::commands::common::load_catalog;

/// What a catalog file contributes once indexed
#[derive(Debug, Serialize)]
pub(crate) struct CatalogSummary<'a> {
    pub tables_count: usize,
    pub columns_count: usize,
    pub pii_columns: usize,
    pub tables: Vec<&'a TableInfo>,
    pub foreign_keys: &'a [JoinEdge],
}

impl<'a> CatalogSummary<'a> {
    pub(crate) fn new(catalog: &'a CatalogIndex) -> Self {
        let tables: Vec<&TableInfo> = catalog.tables().collect();
        Self {
            tables_count: tables.len(),
            columns_count: catalog.len(),
            pii_columns: catalog.entries().iter().filter(|e| e.pii).count(),
            tables,
            foreign_keys: catalog.fk_edges(),
        }
    }
}

/// Execute the catalog command
pub fn execute(args: &CatalogArgs) -> Result<()> {
    let catalog = load_catalog(&args.catalog)?;
    let summary = CatalogSummary::new(&catalog);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "{} tables, {} columns ({} PII)",
        summary.tables_count, summary.columns_count, summary.pii_columns
    );
    for table in &summary.tables {
        match &table.snapshot_date_column {
            Some(column) => println!("  {} ({} columns, snapshot on {column})", table.name, table.columns.len()),
            None => println!("  {} ({} columns)", table.name, table.columns.len()),
        }
    }

    if !summary.foreign_keys.is_empty() {
        println!();
        println!("Foreign keys:");
        for edge in summary.foreign_keys {
            println!(
                "  {}.{} -> {}.{}",
                edge.from_table, edge.from_column, edge.to_table, edge.to_column
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_summary() {
        let catalog = CatalogIndex::from_json_str(
            r#"[
                {"table_name": "CUST", "column_name": "ID"},
                {"table_name": "CUST", "column_name": "NATIONAL_ID", "pii": true},
                {"table_name": "CUST", "column_name": "SNAP_DATE", "is_snapshot_table": "y", "snapshot_date_column": "SNAP_DATE"},
                {"table_name": "CUST", "column_name": "BRANCH_ID", "is_foreign_key": true, "references_table": "BRANCH", "references_column": "ID"},
                {"table_name": "BRANCH", "column_name": "ID"}
            ]"#,
        )
        .unwrap();

        let summary = CatalogSummary::new(&catalog);
        assert_eq!(summary.tables_count, 2);
        assert_eq!(summary.columns_count, 5);
        assert_eq!(summary.pii_columns, 1);
        assert_eq!(summary.foreign_keys.len(), 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["tables"][1]["name"], "CUST");
        assert_eq!(json["tables"][1]["snapshot_date_column"], "SNAP_DATE");
        assert_eq!(json["foreign_keys"][0]["to_table"], "BRANCH");
    }
}
