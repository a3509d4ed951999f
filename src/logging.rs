//! Subscriber setup for applications embedding the exporter.
//!
//! Library code only emits `tracing` events; nothing is printed unless the
//! application calls [`init_logging`] (or installs its own subscriber).

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::ConfigError;

/// Environment variable overriding the configured filter.
pub const LOG_ENV: &str = "GEOPORT_LOG";

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive: a level (`trace` .. `error`, `off`) or a full
    /// `EnvFilter` expression such as `geoport=debug`.
    pub level: String,
    pub format: LogFormat,
    /// Colored output, text format only.
    pub color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
            color: true,
        }
    }
}

impl LoggingConfig {
    /// Builds the event filter, preferring [`LOG_ENV`] when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured directive does not parse.
    pub fn filter(&self) -> Result<EnvFilter, ConfigError> {
        if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.level)
            .map_err(|e| ConfigError::Logging(format!("invalid filter `{}`: {e}", self.level)))
    }
}

/// Installs a global subscriber writing to stderr.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let registry = Registry::default().with(config.filter()?);
    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(config.color)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.map_err(|e| ConfigError::Logging(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Text);
    }

    #[test]
    fn format_parses_lowercase() {
        let config: LoggingConfig = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn bad_directive_is_rejected() {
        if std::env::var_os(LOG_ENV).is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "geoport=notalevel".to_owned(),
            ..LoggingConfig::default()
        };
        assert!(matches!(config.filter(), Err(ConfigError::Logging(_))));
    }
}
