//! Check command implementation

use anyhow::{bail, Result};

use crate::cli::{CheckArgs, CheckMode};
use crate::commands::common::{read_source, ExitCode, EXIT_SQL_REJECTED};
use crate::config::Config;

/// Execute the check command
///
/// Read mode prints the statement with LIMIT enforced; write mode prints the
/// statement unchanged. Either way a violation exits with code 1.
pub fn execute(args: &CheckArgs, config: &Config) -> Result<()> {
    let sql = match (&args.sql, &args.file) {
        (Some(sql), _) => sql.clone(),
        (None, Some(file)) => read_source(file)?,
        (None, None) => bail!("Provide SQL with --sql or --file"),
    };

    let pipeline = config.pipeline();

    let verdict = match args.mode {
        CheckMode::Read => {
            let guard = pipeline.guard();
            guard
                .check_readonly(&sql)
                .map(|()| guard.enforce_limit(&sql))
                .map_err(|e| e.to_string())
        }
        CheckMode::Write => pipeline
            .check_write(&sql)
            .map(|()| sql.trim().to_string())
            .map_err(|e| e.to_string()),
    };

    match verdict {
        Ok(sql) => {
            println!("{sql}");
            Ok(())
        }
        Err(reason) => {
            eprintln!("rejected: {reason}");
            Err(ExitCode(EXIT_SQL_REJECTED).into())
        }
    }
}
