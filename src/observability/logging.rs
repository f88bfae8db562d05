//! Structured logging configuration.

use std::path::PathBuf;

use crate::config::LoggingSettings;

/// Environment variable holding an `EnvFilter` directive.
pub const ENV_LOG_FILTER: &str = "TABLESMITH_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name; anything but `json` is pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Log file; stderr when absent.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds the logging config from file settings and the process
    /// environment.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::resolve(settings, verbose, std::env::var(ENV_LOG_FILTER).ok())
    }

    /// Resolves the filter: `TABLESMITH_LOG`, then `--verbose`, then the
    /// configured level, then `info`.
    #[must_use]
    pub fn resolve(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        env_filter: Option<String>,
    ) -> Self {
        let configured = settings.and_then(|s| s.level.clone());
        let filter = env_filter
            .filter(|f| !f.trim().is_empty())
            .or_else(|| verbose.then(|| "debug".to_string()))
            .or(configured)
            .unwrap_or_else(|| "info".to_string());

        Self {
            filter,
            format: settings
                .and_then(|s| s.format.as_deref())
                .map(LogFormat::parse)
                .unwrap_or_default(),
            file: settings.and_then(|s| s.file.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn settings(level: Option<&str>, format: Option<&str>) -> LoggingSettings {
        LoggingSettings {
            level: level.map(ToString::to_string),
            format: format.map(ToString::to_string),
            file: None,
        }
    }

    #[test_case(None, false, None => "info"; "default")]
    #[test_case(Some("warn"), false, None => "warn"; "configured")]
    #[test_case(Some("warn"), true, None => "debug"; "verbose beats configured")]
    #[test_case(Some("warn"), true, Some("tablesmith=trace") => "tablesmith=trace"; "env wins")]
    #[test_case(None, false, Some(" ") => "info"; "blank env ignored")]
    fn test_filter_precedence(level: Option<&str>, verbose: bool, env: Option<&str>) -> String {
        let s = settings(level, None);
        LoggingConfig::resolve(Some(&s), verbose, env.map(ToString::to_string)).filter
    }

    #[test_case("json" => LogFormat::Json)]
    #[test_case(" JSON " => LogFormat::Json)]
    #[test_case("pretty" => LogFormat::Pretty)]
    #[test_case("compact" => LogFormat::Pretty)]
    fn test_format_parse(s: &str) -> LogFormat {
        LogFormat::parse(s)
    }

    #[test]
    fn test_format_from_settings() {
        let s = settings(None, Some("json"));
        let config = LoggingConfig::resolve(Some(&s), false, None);
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(LoggingConfig::resolve(None, false, None), LoggingConfig::default());
    }
}
