//! Structured logging for the plansql CLI
//!
//! Logs never go to stdout, which carries the generated SQL. Destinations are
//! stderr, a daily rolling file, or both; formats are pretty, json or compact.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "plansql.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    File,
    Both,
}

impl LogOutput {
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "file" => LogOutput::File,
            "both" => LogOutput::Both,
            _ => LogOutput::Stderr,
        }
    }
}

/// Install the global subscriber described by `config`
pub fn init(config: &LoggingConfig) {
    let format = LogFormat::parse(&config.format);
    let output = LogOutput::parse(&config.output);

    let env_filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    let file_layer = || {
        std::fs::create_dir_all(&config.directory).ok();
        let appender = RollingFileAppender::new(Rotation::DAILY, &config.directory, LOG_FILE_PREFIX);
        fmt::layer().with_writer(appender).with_ansi(false).boxed()
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    match output {
        LogOutput::Stderr => registry.with(console_layer).init(),
        LogOutput::File => registry.with(file_layer()).init(),
        LogOutput::Both => registry.with(vec![console_layer, file_layer()]).init(),
    }

    tracing::debug!(?format, ?output, level = %config.level, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("fancy"), LogFormat::Compact);
    }

    #[test]
    fn test_log_output_parse() {
        assert_eq!(LogOutput::parse("file"), LogOutput::File);
        assert_eq!(LogOutput::parse("both"), LogOutput::Both);
        assert_eq!(LogOutput::parse("stderr"), LogOutput::Stderr);
        assert_eq!(LogOutput::parse("stdout"), LogOutput::Stderr);
    }
}
