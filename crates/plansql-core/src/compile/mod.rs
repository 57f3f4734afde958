//! Compiler - lowers a validated, sanitized plan to one SQL SELECT statement
//!
//! Output shape:
//!
//! ```text
//! SELECT <projection>
//! FROM <base> m
//! JOIN <table> t1 ON m.<col> = t1.<col>
//! WHERE <snapshot predicate>
//!   AND <filter>
//! GROUP BY <columns>
//! LIMIT 1000;
//! ```
//!
//! Joins whose target table nothing else references are pruned.
//!
//! The statement's only structural semicolon is the final one, but literals are
//! copied verbatim inside quotes: a filter value containing `;` yields a second
//! semicolon in the text. The lexical guard cannot tell the two apart and
//! rejects such statements as multi-statement, so the pipeline refuses them.

mod alias;

use serde_json::Value;
use thiserror::Error;

use plansql_ir::{ColumnRef, Intent, Metric, MetricKind, Plan};

pub use alias::AliasMap;

pub const DEFAULT_ROW_LIMIT: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("list_rows plan has no select columns and no fallback column is configured")]
    EmptySelect,
}

#[derive(Debug, Clone)]
pub struct CompiledQuery {
    pub sql: String,
    pub aliases: AliasMap,
}

#[derive(Debug, Clone)]
pub struct Compiler {
    row_limit: u32,
    fallback_select: Option<ColumnRef>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
            fallback_select: None,
        }
    }

    pub fn with_row_limit(mut self, row_limit: u32) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Column selected when a list_rows plan arrives with an empty select list
    pub fn with_fallback_select(mut self, column: Option<ColumnRef>) -> Self {
        self.fallback_select = column;
        self
    }

    pub fn compile(&self, plan: &Plan) -> Result<CompiledQuery, CompileError> {
        let mut aliases = AliasMap::new();
        let used_tables = plan.referenced_tables();

        let fallback;
        let (base, projection, group_by) = match &plan.intent {
            Intent::ListRows { select } => {
                let columns = if select.is_empty() {
                    let column = self.fallback_select.clone().ok_or(CompileError::EmptySelect)?;
                    tracing::warn!(fallback = %column, "Empty select list, using fallback column");
                    fallback = [column];
                    &fallback[..]
                } else {
                    select.as_slice()
                };

                let base = columns[0].table.clone();
                aliases.alias(&base);
                let projection: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} AS {}", aliases.qualify(&c.table, &c.column), c.column))
                    .collect();
                (base, projection, &[][..])
            }
            Intent::Aggregate { metric, group_by } => {
                let base = metric.column.table.clone();
                aliases.alias(&base);
                let mut projection: Vec<String> = group_by
                    .iter()
                    .map(|c| format!("{} AS {}", aliases.qualify(&c.table, &c.column), c.column))
                    .collect();
                let column = aliases.qualify(&metric.column.table, &metric.column.column);
                projection.push(format!("{} AS result", metric_expr(metric, &column)));
                (base, projection, group_by.as_slice())
            }
        };

        let mut sql = format!(
            "SELECT {}\nFROM {} {}\n",
            projection.join(", "),
            base,
            aliases.alias(&base)
        );

        for join in &plan.joins {
            if join.to_table != base && !used_tables.contains(join.to_table.as_str()) {
                tracing::debug!(to_table = %join.to_table, "Pruned unused join");
                continue;
            }
            let from = aliases.qualify(&join.from_table, &join.from_column);
            let to = aliases.qualify(&join.to_table, &join.to_column);
            sql.push_str(&format!(
                "JOIN {} {} ON {} = {}\n",
                join.to_table,
                aliases.alias(&join.to_table),
                from,
                to
            ));
        }

        let mut predicates = Vec::new();
        let snapshot = plan.snapshot();
        if let Some(snapshot) = snapshot {
            predicates.push(format!(
                "{} = {}",
                aliases.qualify(&snapshot.table, &snapshot.snapshot_date_column),
                quote_text(&snapshot.date)
            ));
        }
        for filter in plan.valid_filters() {
            // The sanitizer already removes these; compiled SQL must never carry both
            if snapshot.is_some_and(|s| filter.targets(&s.table, &s.snapshot_date_column)) {
                continue;
            }
            predicates.push(format!(
                "{} {} {}",
                aliases.qualify(&filter.table, &filter.column),
                filter.op.as_sql(),
                quote_literal(&filter.value)
            ));
        }
        if !predicates.is_empty() {
            sql.push_str(&format!("WHERE {}\n", predicates.join("\n  AND ")));
        }

        if !group_by.is_empty() {
            let keys: Vec<String> = group_by
                .iter()
                .map(|c| aliases.qualify(&c.table, &c.column))
                .collect();
            sql.push_str(&format!("GROUP BY {}\n", keys.join(", ")));
        }

        let sql = format!("{}\nLIMIT {};", sql.trim_end(), self.row_limit);

        tracing::debug!(
            intent = plan.intent.name(),
            tables = aliases.len(),
            predicates = predicates.len(),
            "Compiled plan"
        );

        Ok(CompiledQuery { sql, aliases })
    }
}

fn metric_expr(metric: &Metric, column: &str) -> String {
    match &metric.kind {
        MetricKind::Count if metric.distinct => format!("COUNT(DISTINCT {column})"),
        MetricKind::Count => format!("COUNT({column})"),
        MetricKind::Sum => format!("SUM({column})"),
        MetricKind::Avg => format!("AVG({column})"),
        MetricKind::Other(name) => {
            tracing::warn!(metric = %name, "Unknown metric type, counting distinct values instead");
            format!("COUNT(DISTINCT {column})")
        }
    }
}

/// Render a JSON literal as a single-quoted SQL string, or `NULL`
pub fn quote_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => quote_text(s),
        other => quote_text(&other.to_string()),
    }
}

/// Strip one layer of quotes the planner may already have added, then escape
pub fn quote_text(raw: &str) -> String {
    let mut text = raw.trim();
    let wrapped = text.len() >= 2
        && ((text.starts_with('\'') && text.ends_with('\''))
            || (text.starts_with('"') && text.ends_with('"')));
    if wrapped {
        text = text[1..text.len() - 1].trim();
    }
    format!("'{}'", text.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plansql_ir::{Filter, FilterEntry, FilterOp, JoinEdge};
    use serde_json::json;

    fn col(table: &str, column: &str) -> ColumnRef {
        ColumnRef::new(table, column)
    }

    fn filter(table: &str, column: &str, op: FilterOp, value: Value) -> Filter {
        Filter {
            table: table.to_string(),
            column: column.to_string(),
            op,
            value,
        }
    }

    fn metric(kind: MetricKind, distinct: bool) -> Metric {
        Metric {
            kind,
            distinct,
            column: col("CUST", "ID"),
        }
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal(&json!(null)), "NULL");
        assert_eq!(quote_literal(&json!("EU")), "'EU'");
        assert_eq!(quote_literal(&json!("'EU'")), "'EU'");
        assert_eq!(quote_literal(&json!("\" EU \"")), "'EU'");
        assert_eq!(quote_literal(&json!("O'Brien")), "'O''Brien'");
        assert_eq!(quote_literal(&json!("''")), "''");
        assert_eq!(quote_literal(&json!("x' OR '1'='1")), "'x'' OR ''1''=''1'");
        assert_eq!(quote_literal(&json!(42)), "'42'");
        assert_eq!(quote_literal(&json!(true)), "'true'");
        // Only one layer is stripped
        assert_eq!(quote_literal(&json!("''X''")), "'''X'''");
    }

    #[test]
    fn test_list_rows_shape() {
        let plan = Plan::list_rows(vec![col("CUST", "ID"), col("CUST", "REGION")])
            .with_filter(filter("CUST", "REGION", FilterOp::Eq, json!("EU")))
            .with_filter(filter("CUST", "AGE", FilterOp::Ge, json!(18)));

        let compiled = Compiler::new().compile(&plan).unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT m.ID AS ID, m.REGION AS REGION\n\
             FROM CUST m\n\
             WHERE m.REGION = 'EU'\n  AND m.AGE >= '18'\n\
             LIMIT 1000;"
        );
    }

    #[test]
    fn test_aggregate_metric_expressions() {
        let cases = [
            (metric(MetricKind::Count, true), "COUNT(DISTINCT m.ID)"),
            (metric(MetricKind::Count, false), "COUNT(m.ID)"),
            (metric(MetricKind::Sum, true), "SUM(m.ID)"),
            (metric(MetricKind::Avg, false), "AVG(m.ID)"),
            (metric(MetricKind::Other("median".to_string()), false), "COUNT(DISTINCT m.ID)"),
        ];

        for (metric, expected) in cases {
            let compiled = Compiler::new().compile(&Plan::aggregate(metric, vec![])).unwrap();
            assert_eq!(
                compiled.sql,
                format!("SELECT {expected} AS result\nFROM CUST m\nLIMIT 1000;")
            );
        }
    }

    #[test]
    fn test_join_aliases_and_pruning() {
        let plan = Plan::aggregate(metric(MetricKind::Count, true), vec![col("BRANCH", "NAME")])
            .with_join(JoinEdge::new("CUST", "SEGMENT_ID", "SEGMENT", "ID"))
            .with_join(JoinEdge::new("CUST", "BRANCH_ID", "BRANCH", "ID"))
            .with_join(JoinEdge::new("BRANCH", "CITY_ID", "CITY", "ID"))
            .with_filter(filter("CITY", "NAME", FilterOp::Eq, json!("Izmir")));

        let compiled = Compiler::new().compile(&plan).unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT t1.NAME AS NAME, COUNT(DISTINCT m.ID) AS result\n\
             FROM CUST m\n\
             JOIN BRANCH t1 ON m.BRANCH_ID = t1.ID\n\
             JOIN CITY t2 ON t1.CITY_ID = t2.ID\n\
             WHERE t2.NAME = 'Izmir'\n\
             GROUP BY t1.NAME\n\
             LIMIT 1000;"
        );
        assert!(!compiled.sql.contains("SEGMENT"));
        assert_eq!(compiled.aliases.get("CITY"), Some("t2"));
        assert_eq!(compiled.aliases.get("SEGMENT"), None);
    }

    #[test]
    fn test_snapshot_predicate_first_and_duplicates_skipped() {
        // Unsanitized on purpose: the compiler must still drop the duplicate
        let plan = Plan::list_rows(vec![col("CUST", "ID")])
            .with_snapshot("CUST", "SNAP_DATE", "'2025-12-31'")
            .with_filter(filter("CUST", "SNAP_DATE", FilterOp::Le, json!("2025-12-31")))
            .with_filter(filter("CUST", "STATUS", FilterOp::Ne, json!(null)))
            .with_filter(FilterEntry::Malformed(json!(["CUST", "ID"])));

        let compiled = Compiler::new().compile(&plan).unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT m.ID AS ID\n\
             FROM CUST m\n\
             WHERE m.SNAP_DATE = '2025-12-31'\n  AND m.STATUS <> NULL\n\
             LIMIT 1000;"
        );
    }

    #[test]
    fn test_empty_select_fallback() {
        let plan = Plan::list_rows(vec![]);

        assert_eq!(Compiler::new().compile(&plan).unwrap_err(), CompileError::EmptySelect);

        let compiled = Compiler::new()
            .with_fallback_select(Some(col("CUST", "ID")))
            .compile(&plan)
            .unwrap();
        assert_eq!(compiled.sql, "SELECT m.ID AS ID\nFROM CUST m\nLIMIT 1000;");
    }

    #[test]
    fn test_row_limit_and_semicolon_inside_literal() {
        let plan = Plan::list_rows(vec![col("CUST", "ID")])
            .with_filter(filter("CUST", "NOTE", FilterOp::Like, json!("%;%")));

        let sql = Compiler::new().with_row_limit(50).compile(&plan).unwrap().sql;
        assert!(sql.starts_with("SELECT "));
        assert!(sql.ends_with("\nLIMIT 50;"));
        assert_eq!(sql.matches(';').count(), 2); // one inside the literal
        assert!(sql.contains("m.NOTE LIKE '%;%'"));
    }
}
