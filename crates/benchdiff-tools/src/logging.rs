//! Structured logging setup.

use std::env;
use std::fs::{File, OpenOptions};
use std::io;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the default log filter.
pub const TRACE_ENV: &str = "BENCHDIFF_TRACE";
/// Environment variable selecting `pretty` or `json` output.
pub const LOG_FORMAT_ENV: &str = "BENCHDIFF_LOG_FORMAT";
/// Environment variable naming an additional log file.
pub const LOG_FILE_ENV: &str = "BENCHDIFF_LOG_FILE";

const DEFAULT_LEVEL: &str = "warn";

/// Errors produced while installing the subscriber.
#[derive(Debug)]
pub enum LoggingError {
    InvalidFilter(String),
    InvalidFormat(String),
    LogFile { path: String, source: io::Error },
    Init(String),
}

impl std::fmt::Display for LoggingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggingError::InvalidFilter(msg) => write!(f, "Invalid log filter: {msg}"),
            LoggingError::InvalidFormat(format) => write!(
                f,
                "Invalid {LOG_FORMAT_ENV} '{format}' (expected 'json' or 'pretty')"
            ),
            LoggingError::LogFile { path, source } => {
                write!(f, "Failed to open log file {path}: {source}")
            }
            LoggingError::Init(msg) => write!(f, "Failed to initialize logging: {msg}"),
        }
    }
}

impl std::error::Error for LoggingError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

fn parse_format(value: &str) -> Result<LogFormat, LoggingError> {
    if value.eq_ignore_ascii_case("json") {
        Ok(LogFormat::Json)
    } else if value.eq_ignore_ascii_case("pretty") {
        Ok(LogFormat::Pretty)
    } else {
        Err(LoggingError::InvalidFormat(value.to_string()))
    }
}

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if level.eq_ignore_ascii_case("off") {
        Ok(EnvFilter::default().add_directive(LevelFilter::OFF.into()))
    } else {
        EnvFilter::try_new(level).map_err(|err| LoggingError::InvalidFilter(err.to_string()))
    }
}

fn open_log_file(path: &str) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::LogFile {
            path: path.to_string(),
            source,
        })
}

fn map_init_err<E: std::fmt::Display>(err: E) -> LoggingError {
    LoggingError::Init(err.to_string())
}

/// Install the global `tracing` subscriber.
///
/// When `level` is `None`, this reads [`TRACE_ENV`], falling back to `warn`.
/// Logs go to stderr so stdout stays reserved for the report. Returns `false`
/// if a subscriber is already configured.
pub fn init_logging(level: Option<&str>) -> Result<bool, LoggingError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let level_value = level
        .map(str::to_string)
        .or_else(|| env::var(TRACE_ENV).ok())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    let filter = build_filter(&level_value)?;

    let format = parse_format(&env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string()))?;
    let log_file = env::var(LOG_FILE_ENV).ok();

    match format {
        LogFormat::Json => {
            let stderr_layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .json();
            let base = tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer);
            if let Some(path) = log_file {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(open_log_file(&path)?)
                    .with_ansi(false)
                    .json();
                base.with(file_layer).try_init().map_err(map_init_err)?;
            } else {
                base.try_init().map_err(map_init_err)?;
            }
        }
        LogFormat::Pretty => {
            let stderr_layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .pretty();
            let base = tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer);
            if let Some(path) = log_file {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(open_log_file(&path)?)
                    .with_ansi(false)
                    .pretty();
                base.with(file_layer).try_init().map_err(map_init_err)?;
            } else {
                base.try_init().map_err(map_init_err)?;
            }
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("json").ok(), Some(LogFormat::Json));
        assert_eq!(parse_format("PRETTY").ok(), Some(LogFormat::Pretty));
        let err = parse_format("xml").err();
        assert!(matches!(err, Some(LoggingError::InvalidFormat(_))));
    }

    #[test]
    fn test_build_filter() {
        assert!(build_filter("off").is_ok());
        assert!(build_filter("benchdiff_runner=debug,warn").is_ok());
        assert!(matches!(
            build_filter("benchdiff=notalevel"),
            Err(LoggingError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_error_display() {
        let err = LoggingError::InvalidFormat("xml".to_string());
        assert!(err.to_string().contains(LOG_FORMAT_ENV));
        assert!(err.to_string().contains("xml"));
    }
}
