//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log format.
pub const LOG_FORMAT_ENV: &str = "ENGRAM_BRIDGE_LOG_FORMAT";

/// Environment variable overriding the log file.
pub const LOG_FILE_ENV: &str = "ENGRAM_BRIDGE_LOG_FILE";

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    #[default]
    Compact,
}

impl LogFormat {
    /// Parses a format name, ignoring case.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            "compact" | "text" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Line format.
    pub format: LogFormat,
    /// Level filter.
    pub filter: EnvFilter,
    /// Optional log file; stderr when absent.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Resolves logging from settings, CLI verbosity, and the environment.
    ///
    /// The filter comes from `RUST_LOG` if set, else `debug` when `verbose`,
    /// else the configured level.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        let format = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .or_else(|| settings.format.clone())
            .and_then(|name| LogFormat::parse(&name))
            .unwrap_or_default();

        let file = std::env::var_os(LOG_FILE_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| settings.file.clone());

        let default_level = if verbose { "debug" } else { settings.level.as_str() };
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        Self {
            format,
            filter,
            file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("xml"), None);
        assert_eq!(LogFormat::default(), LogFormat::Compact);
    }
}
