//! Configuration for the plansql CLI
//!
//! Loads configuration from:
//! 1. plansql.yaml - compiler, guard, validation and logging settings
//! 2. .env file / process environment - overrides
//!
//! Environment variables always override file values. A missing config file
//! means defaults.

use plansql_core::compile::{Compiler, DEFAULT_ROW_LIMIT};
use plansql_core::guard::{SqlGuard, DEFAULT_LIMIT};
use plansql_core::ir::ColumnRef;
use plansql_core::pipeline::QueryPipeline;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// LIMIT appended to every compiled statement
    pub row_limit: u32,

    /// Column used when a list_rows plan has an empty select list
    pub fallback_select: Option<ColumnRef>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
            fallback_select: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// LIMIT injected into read queries that carry none
    pub default_limit: u32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub reject_pii: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific filter
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stderr, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            output: "stderr".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub compiler: CompilerConfig,
    pub guard: GuardConfig,
    pub validation: ValidationConfig,
    pub logging: LoggingConfig,

    /// Environment overrides that failed to parse. Config loads before the
    /// subscriber exists, so these are reported after `logging::init`.
    #[serde(skip)]
    pub ignored_overrides: Vec<String>,
}

impl Config {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            return Self::load(path);
        }
        let mut config = Config::default();
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(limit) = self.env_parse("PLANSQL_ROW_LIMIT") {
            self.compiler.row_limit = limit;
        }
        if let Some(limit) = self.env_parse("PLANSQL_DEFAULT_LIMIT") {
            self.guard.default_limit = limit;
        }
        if let Some(reject) = self.env_parse("PLANSQL_REJECT_PII") {
            self.validation.reject_pii = reject;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }
    }

    fn env_parse<T: std::str::FromStr>(&mut self, key: &str) -> Option<T> {
        let raw = std::env::var(key).ok()?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.ignored_overrides.push(format!("{key}={raw}"));
                None
            }
        }
    }

    pub fn pipeline(&self) -> QueryPipeline {
        let compiler = Compiler::new()
            .with_row_limit(self.compiler.row_limit)
            .with_fallback_select(self.compiler.fallback_select.clone());
        let guard = SqlGuard::new().with_default_limit(self.guard.default_limit);

        QueryPipeline::new(compiler, guard).with_pii_rejection(self.validation.reject_pii)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.compiler.row_limit, 1000);
        assert_eq!(config.compiler.fallback_select, None);
        assert_eq!(config.guard.default_limit, 1000);
        assert!(!config.validation.reject_pii);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.output, "stderr");
    }

    #[test]
    fn test_partial_yaml_and_env_override() {
        std::env::set_var("PLANSQL_DEFAULT_LIMIT", "250");
        std::env::set_var("PLANSQL_REJECT_PII", "not-a-bool");

        let config_yaml = r#"
compiler:
  row_limit: 500
  fallback_select:
    table: "CUST"
    column: "ID"
validation:
  reject_pii: true
"#;
        let temp_file = std::env::temp_dir().join("plansql_test_config.yaml");
        std::fs::write(&temp_file, config_yaml).unwrap();

        let config = Config::load(&temp_file).unwrap();
        assert_eq!(config.compiler.row_limit, 500);
        assert_eq!(config.compiler.fallback_select, Some(ColumnRef::new("CUST", "ID")));
        assert_eq!(config.guard.default_limit, 250); // Overridden
        assert!(config.validation.reject_pii); // Bad override ignored
        assert_eq!(config.ignored_overrides, vec!["PLANSQL_REJECT_PII=not-a-bool"]);
        assert_eq!(config.logging.format, "compact");

        std::env::remove_var("PLANSQL_DEFAULT_LIMIT");
        std::env::remove_var("PLANSQL_REJECT_PII");
        std::fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let missing = std::env::temp_dir().join("plansql_does_not_exist.yaml");
        let config = Config::load_or_default(&missing).unwrap();
        assert_eq!(config.compiler.row_limit, 1000);
    }
}
