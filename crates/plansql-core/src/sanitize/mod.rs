//! Plan sanitizer
//!
//! Normalizes planner output before compilation. Never fails: redundant or
//! malformed filter entries are dropped, counted and logged.

use serde::Serialize;

use plansql_ir::{FilterEntry, Plan};

/// How many filter entries a sanitizer pass removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
    /// Filters on the snapshot date column, superseded by the time filter
    pub redundant: usize,
    /// Entries that did not decode as a filter, including unsupported operators
    pub malformed: usize,
}

impl SanitizeReport {
    pub fn total(&self) -> usize {
        self.redundant + self.malformed
    }
}

pub fn sanitize(plan: Plan) -> Plan {
    sanitize_with_report(plan).0
}

/// The snapshot time filter owns its column: any filter on the same
/// (table, snapshot_date_column) is dropped whatever its operator.
pub fn sanitize_with_report(mut plan: Plan) -> (Plan, SanitizeReport) {
    let mut report = SanitizeReport::default();
    let snapshot = plan.snapshot().cloned();

    plan.filters.retain(|entry| match entry {
        FilterEntry::Malformed(raw) => {
            tracing::warn!(entry = %raw, "Dropping malformed filter entry");
            report.malformed += 1;
            false
        }
        FilterEntry::Unsupported(raw) => {
            tracing::warn!(
                table = %raw.table,
                column = %raw.column,
                op = %raw.op,
                "Dropping filter with unsupported operator"
            );
            report.malformed += 1;
            false
        }
        FilterEntry::Valid(filter) => {
            let superseded = snapshot
                .as_ref()
                .is_some_and(|s| filter.targets(&s.table, &s.snapshot_date_column));
            if superseded {
                tracing::debug!(
                    column = %filter.column_ref(),
                    op = %filter.op,
                    "Dropping filter superseded by snapshot time filter"
                );
                report.redundant += 1;
            }
            !superseded
        }
    });

    if report.total() > 0 {
        tracing::info!(
            redundant = report.redundant,
            malformed = report.malformed,
            remaining = plan.filters.len(),
            "Sanitized plan filters"
        );
    }

    (plan, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plansql_ir::{ColumnRef, Filter, FilterOp, UnsupportedFilter};
    use serde_json::json;

    fn filter(column: &str, op: FilterOp, value: serde_json::Value) -> Filter {
        Filter {
            table: "CUST".to_string(),
            column: column.to_string(),
            op,
            value,
        }
    }

    fn snapshot_plan() -> Plan {
        Plan::list_rows(vec![ColumnRef::new("CUST", "ID")])
            .with_snapshot("CUST", "SNAP_DATE", "2025-12-31")
            .with_filter(filter("SNAP_DATE", FilterOp::Ge, json!("2025-01-01")))
            .with_filter(filter("SNAP_DATE", FilterOp::Eq, json!("2025-12-31")))
            .with_filter(filter("REGION", FilterOp::Eq, json!("EU")))
            .with_filter(FilterEntry::Malformed(json!({"table": "CUST", "op": "="})))
    }

    #[test]
    fn test_snapshot_filters_dropped_regardless_of_operator() {
        let (plan, report) = sanitize_with_report(snapshot_plan());

        assert_eq!(
            plan.filters,
            vec![FilterEntry::Valid(filter("REGION", FilterOp::Eq, json!("EU")))]
        );
        assert_eq!(report, SanitizeReport { redundant: 2, malformed: 1 });
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_no_snapshot_keeps_date_filters() {
        let mut plan = snapshot_plan();
        plan.time_filter = Default::default();

        let (plan, report) = sanitize_with_report(plan);
        assert_eq!(plan.filters.len(), 3);
        assert_eq!(report, SanitizeReport { redundant: 0, malformed: 1 });
    }

    #[test]
    fn test_same_column_other_table_kept() {
        let plan = Plan::list_rows(vec![ColumnRef::new("CUST", "ID")])
            .with_snapshot("CUST", "SNAP_DATE", "2025-12-31")
            .with_filter(Filter {
                table: "BRANCH".to_string(),
                column: "SNAP_DATE".to_string(),
                op: FilterOp::Eq,
                value: json!("2025-12-31"),
            });

        assert_eq!(sanitize(plan.clone()), plan);
    }

    #[test]
    fn test_unsupported_operator_counted_as_malformed() {
        let plan = Plan::list_rows(vec![ColumnRef::new("CUST", "ID")]).with_filter(
            FilterEntry::Unsupported(UnsupportedFilter {
                table: "CUST".to_string(),
                column: "REGION".to_string(),
                op: "between".to_string(),
                value: json!(["A", "M"]),
            }),
        );

        let (plan, report) = sanitize_with_report(plan);
        assert!(plan.filters.is_empty());
        assert_eq!(report, SanitizeReport { redundant: 0, malformed: 1 });
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize(snapshot_plan());
        let (twice, report) = sanitize_with_report(once.clone());

        assert_eq!(once, twice);
        assert_eq!(report, SanitizeReport::default());
    }

    #[test]
    fn test_other_fields_untouched() {
        let original = snapshot_plan();
        let cleaned = sanitize(original.clone());

        assert_eq!(cleaned.intent, original.intent);
        assert_eq!(cleaned.time_filter, original.time_filter);
        assert_eq!(cleaned.joins, original.joins);
    }
}
