//! Maps a plan back to the catalog metadata of every column it touches

use std::collections::HashMap;

use plansql_catalog::{CatalogEntry, CatalogIndex};
use plansql_ir::{ColumnRef, Plan};

/// Catalog entries for the columns a plan reads, for audit and explanation.
///
/// Each referenced pair is looked up in the candidate shortlist first and the
/// full catalog second; pairs found in neither are omitted. One entry per pair,
/// ordered by (table, column).
pub fn used_columns<'a>(
    plan: &Plan,
    catalog: &'a CatalogIndex,
    candidates: &'a [CatalogEntry],
) -> Vec<&'a CatalogEntry> {
    let shortlist: HashMap<ColumnRef, &CatalogEntry> = candidates
        .iter()
        .map(|entry| (entry.column_ref(), entry))
        .collect();

    plan.referenced_columns()
        .iter()
        .filter_map(|pair| {
            shortlist
                .get(pair)
                .copied()
                .or_else(|| catalog.get_ref(pair))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plansql_ir::{Filter, FilterOp, JoinEdge, Metric, MetricKind};
    use serde_json::json;

    fn entry(table: &str, column: &str, description: &str) -> CatalogEntry {
        let mut entry = CatalogEntry::new(table, column);
        entry.description = description.to_string();
        entry
    }

    #[test]
    fn test_candidates_preferred_then_catalog() {
        let catalog = CatalogIndex::from_entries(vec![
            entry("CUST", "ID", "catalog"),
            entry("CUST", "REGION", "catalog"),
            entry("CUST", "SNAP_DATE", "catalog"),
            entry("BRANCH", "ID", "catalog"),
        ])
        .unwrap();
        let candidates = vec![entry("CUST", "REGION", "candidate")];

        let plan = Plan::aggregate(
            Metric {
                kind: MetricKind::Count,
                distinct: true,
                column: ColumnRef::new("CUST", "ID"),
            },
            vec![ColumnRef::new("CUST", "REGION")],
        )
        .with_snapshot("CUST", "SNAP_DATE", "2025-12-31")
        .with_filter(Filter {
            table: "CUST".to_string(),
            column: "REGION".to_string(),
            op: FilterOp::Eq,
            value: json!("EU"),
        })
        .with_filter(Filter {
            table: "CUST".to_string(),
            column: "GHOST".to_string(),
            op: FilterOp::Eq,
            value: json!(1),
        })
        .with_join(JoinEdge::new("CUST", "BRANCH_ID", "BRANCH", "ID"));

        let used: Vec<(String, &str)> = used_columns(&plan, &catalog, &candidates)
            .into_iter()
            .map(|e| (e.column_ref().to_string(), e.description.as_str()))
            .collect();

        assert_eq!(
            used,
            vec![
                ("CUST.ID".to_string(), "catalog"),
                ("CUST.REGION".to_string(), "candidate"),
                ("CUST.SNAP_DATE".to_string(), "catalog"),
            ]
        );
    }
}
