//! Structured logging setup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Crates whose events are shown at the configured level.
const CATALOG_TARGETS: &[&str] = &[
    "catalog_core",
    "catalog_data",
    "catalog_cache",
    "catalog_browse",
    "catalog_cli",
];

/// Log level for structured logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Level for a `-v` count: 0 warn, 1 info, 2 debug, 3+ trace.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Self::Warn,
            1 => Self::Info,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    fn directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trace => write!(f, "TRACE"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(LoggingError::UnknownLevel(other.to_string())),
        }
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON lines, for log aggregation.
    Json,
    /// Human-readable format (for development).
    #[default]
    Human,
}

/// Logging setup failures.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("unknown log level: {0}")]
    UnknownLevel(String),

    #[error("invalid log filter: {0}")]
    Filter(String),

    #[error("a global logger is already installed")]
    AlreadyInstalled,
}

/// Filter directive for `level`: our crates at `level`, everything else at
/// warn or quieter.
pub fn filter_directive(level: LogLevel) -> String {
    let others = level.max(LogLevel::Warn).directive();
    let mut directive = others.to_string();
    for target in CATALOG_TARGETS {
        directive.push(',');
        directive.push_str(target);
        directive.push('=');
        directive.push_str(level.directive());
    }
    directive
}

/// Build the event filter. `RUST_LOG` wins when set and valid.
pub fn env_filter(level: LogLevel) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter_directive(level)))
        .map_err(|e| LoggingError::Filter(e.to_string()))
}

/// Install the global subscriber writing to stderr.
pub fn init_logging(level: LogLevel, format: LogFormat) -> Result<(), LoggingError> {
    let filter = env_filter(level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = match format {
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
        LogFormat::Human => builder.compact().try_init(),
    };
    installed.map_err(|_| LoggingError::AlreadyInstalled)?;

    tracing::debug!(%level, ?format, "logging initialised");
    Ok(())
}
