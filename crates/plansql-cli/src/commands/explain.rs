//! Explain command implementation

use anyhow::Result;

use plansql_core::explain::explain;
use plansql_core::sanitize::sanitize;
use plansql_core::used_columns::used_columns;
use plansql_core::validate::Validator;

use crate::cli::ExplainArgs;
use crate::commands::common::{load_catalog, load_plan, ExitCode, EXIT_PLAN_REJECTED};
use crate::config::Config;

/// Execute the explain command
pub fn execute(args: &ExplainArgs, config: &Config) -> Result<()> {
    let catalog = load_catalog(&args.input.catalog)?;
    let plan = load_plan(&args.input)?;

    if let Err(e) = Validator::new(&catalog)
        .reject_pii(config.validation.reject_pii)
        .validate(&plan)
    {
        eprintln!("error: {e}");
        return Err(ExitCode(EXIT_PLAN_REJECTED).into());
    }

    let plan = sanitize(plan);
    println!("{}", explain(&plan));

    let columns = used_columns(&plan, &catalog, &[]);
    if !columns.is_empty() {
        println!();
        println!("Columns used:");
        for entry in columns {
            let mut line = format!("  {}.{}", entry.table_name, entry.column_name);
            if !entry.data_type.is_empty() {
                line.push_str(&format!(" ({})", entry.data_type));
            }
            if !entry.description.is_empty() {
                line.push_str(&format!(" - {}", entry.description));
            }
            if entry.pii {
                line.push_str(" [PII]");
            }
            println!("{line}");
        }
    }

    Ok(())
}
