//! Plain-language summary of a plan, shown next to the generated SQL

use plansql_ir::{Intent, Plan};

pub fn explain(plan: &Plan) -> String {
    let mut parts = Vec::new();

    match &plan.intent {
        Intent::ListRows { select } if select.is_empty() => {
            parts.push("Row listing query.".to_string());
        }
        Intent::ListRows { select } => {
            let columns: Vec<String> = select.iter().map(ToString::to_string).collect();
            parts.push(format!(
                "Row listing query. Selected columns: {}.",
                columns.join(", ")
            ));
        }
        Intent::Aggregate { metric, .. } => {
            let name = String::from(metric.kind.clone()).to_uppercase();
            let distinct = if metric.distinct { "DISTINCT " } else { "" };
            parts.push(format!("Aggregate query: {name}({distinct}{}).", metric.column));
        }
    }

    if let Some(snapshot) = plan.snapshot() {
        parts.push(format!(
            "Snapshot filter applied: {} = {}.",
            snapshot.column_ref(),
            snapshot.date
        ));
    }

    if !plan.filters.is_empty() {
        parts.push(format!("Filters applied: {}.", plan.filters.len()));
    }

    if let Intent::Aggregate { group_by, .. } = &plan.intent {
        if !group_by.is_empty() {
            let columns: Vec<String> = group_by.iter().map(ToString::to_string).collect();
            parts.push(format!("Grouped by: {}.", columns.join(", ")));
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use plansql_ir::{ColumnRef, Filter, FilterOp, Metric, MetricKind};
    use serde_json::json;

    #[test]
    fn test_explain_aggregate() {
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
            column: "SEGMENT".to_string(),
            op: FilterOp::Eq,
            value: json!("X"),
        });

        assert_eq!(
            explain(&plan),
            "Aggregate query: COUNT(DISTINCT CUST.ID). \
             Snapshot filter applied: CUST.SNAP_DATE = 2025-12-31. \
             Filters applied: 1. \
             Grouped by: CUST.REGION."
        );
    }

    #[test]
    fn test_explain_list_rows() {
        let plan = Plan::list_rows(vec![ColumnRef::new("CUST", "ID"), ColumnRef::new("CUST", "REGION")]);
        assert_eq!(
            explain(&plan),
            "Row listing query. Selected columns: CUST.ID, CUST.REGION."
        );
        assert_eq!(explain(&Plan::list_rows(vec![])), "Row listing query.");
    }
}
