//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// plansql - compile structured query plans into guarded SQL
#[derive(Parser, Debug)]
#[command(name = "plansql")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the YAML config file (missing file means defaults)
    #[arg(short, long, global = true, default_value = "plansql.yaml")]
    pub config: PathBuf,

    /// Reject plans that touch PII columns, overriding the config file
    #[arg(long, global = true)]
    pub reject_pii: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate, sanitize and compile a plan into a read-only SQL statement
    Compile(CompileArgs),

    /// Describe a plan in plain language without compiling it
    Explain(ExplainArgs),

    /// Run the SQL guard over a statement
    Check(CheckArgs),

    /// Summarize a catalog file: tables, snapshot columns, foreign keys
    Catalog(CatalogArgs),
}

/// Plan and catalog inputs shared by compile and explain
#[derive(Args, Debug, Clone)]
pub struct PlanInput {
    /// Catalog JSON file (array of column entries)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Plan JSON file, or "-" for stdin
    #[arg(long, default_value = "-")]
    pub plan: String,
}

#[derive(Args, Debug)]
pub struct CompileArgs {
    #[command(flatten)]
    pub input: PlanInput,

    /// Shortlisted catalog entries (JSON array) preferred for column metadata
    #[arg(long)]
    pub candidates: Option<PathBuf>,

    /// Print the full prepared query as JSON instead of bare SQL
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ExplainArgs {
    #[command(flatten)]
    pub input: PlanInput,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Which guard policy to apply
    #[arg(short, long, value_enum, default_value = "read")]
    pub mode: CheckMode,

    /// SQL text to check
    #[arg(long, conflicts_with = "file")]
    pub sql: Option<String>,

    /// File holding the SQL to check, or "-" for stdin
    #[arg(short, long)]
    pub file: Option<String>,
}

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Catalog JSON file (array of column entries)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckMode {
    /// Read-only policy, then LIMIT injection
    Read,
    /// Write policy (UPDATE/DELETE need WHERE)
    Write,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
