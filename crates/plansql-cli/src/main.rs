//! plansql CLI - compile query plans to guarded SQL from the shell

use anyhow::{Context, Result};
use clap::Parser;

mod cli;
mod commands;
mod config;
mod logging;

use cli::{Cli, Commands};
use commands::common::ExitCode;
use commands::{catalog, check, compile, explain};
use config::Config;

fn main() {
    if let Err(err) = run() {
        if let Some(ExitCode(code)) = err.downcast_ref::<ExitCode>() {
            std::process::exit(*code);
        }
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.global.config)
        .with_context(|| format!("Failed to load config {}", cli.global.config.display()))?;
    if cli.global.reject_pii {
        config.validation.reject_pii = true;
    }

    logging::init(&config.logging);
    for ignored in &config.ignored_overrides {
        tracing::warn!(entry = %ignored, "Ignoring unparsable environment override");
    }
    tracing::debug!(config = %cli.global.config.display(), "Configuration loaded");

    match &cli.command {
        Commands::Compile(args) => compile::execute(args, &config),
        Commands::Explain(args) => explain::execute(args, &config),
        Commands::Check(args) => check::execute(args, &config),
        Commands::Catalog(args) => catalog::execute(args),
    }
}
