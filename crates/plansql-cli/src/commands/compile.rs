//! Compile command implementation

use anyhow::Result;

use crate::cli::CompileArgs;
use crate::commands::common::{exit_code_for, load_candidates, load_catalog, load_plan, ExitCode};
use crate::config::Config;

/// Execute the compile command
pub fn execute(args: &CompileArgs, config: &Config) -> Result<()> {
    let catalog = load_catalog(&args.input.catalog)?;
    let candidates = load_candidates(args.candidates.as_deref())?;
    let plan = load_plan(&args.input)?;

    let prepared = match config.pipeline().prepare(plan, &catalog, &candidates) {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("error: {e}");
            return Err(ExitCode(exit_code_for(&e)).into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prepared)?);
    } else {
        println!("{}", prepared.sql);
        for flag in &prepared.risk_flags {
            eprintln!("warning: {flag}");
        }
    }

    let dropped = prepared.dropped_filters;
    if dropped.total() > 0 {
        eprintln!(
            "note: dropped {} filter(s) ({} redundant with snapshot, {} malformed)",
            dropped.total(),
            dropped.redundant,
            dropped.malformed
        );
    }

    Ok(())
}
