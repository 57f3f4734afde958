//! PlanSQL core - from a planner's query plan to a guarded SQL statement
//!
//! - [`validate`]: every column the plan touches must exist in the catalog
//! - [`sanitize`]: drop filters that are redundant with the snapshot time filter
//! - [`compile`]: deterministic SQL generation with table aliases and join pruning
//! - [`guard`]: lexical read-only / write policy over any SQL text
//! - [`used_columns`]: catalog metadata for the columns a plan reads
//!
//! Everything here is synchronous and free of I/O.

pub mod compile;
pub mod explain;
pub mod guard;
pub mod pipeline;
pub mod sanitize;
pub mod used_columns;
pub mod validate;

pub use plansql_catalog as catalog;
pub use plansql_ir as ir;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::compile::{CompiledQuery, Compiler};
    pub use crate::explain::explain;
    pub use crate::guard::{GuardViolation, SqlGuard};
    pub use crate::pipeline::{PipelineError, PreparedQuery, QueryPipeline, RiskFlag};
    pub use crate::sanitize::{sanitize, sanitize_with_report, SanitizeReport};
    pub use crate::used_columns::used_columns;
    pub use crate::validate::{ValidationError, Validator};
    pub use plansql_catalog::{CatalogEntry, CatalogIndex};
    pub use plansql_ir::Plan;
}
