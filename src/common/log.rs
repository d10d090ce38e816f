//! Structured logging through `tracing`.
//!
//! Events carry dataset and model identifiers, prediction labels and
//! latencies. Feature values are patient data and are never logged.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt as tfmt, EnvFilter};

use crate::common::error::{DashError, DashResult};

static LOGGING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Output format of the log stream on stderr.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => f.write_str("pretty"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {other:?} (expected pretty or json)")),
        }
    }
}

/// Logging configuration. `RUST_LOG` takes precedence over `level`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LogCfg {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogCfg {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Install the global subscriber. Only the first call succeeds.
pub fn init_logging(cfg: &LogCfg) -> DashResult<()> {
    if LOGGING_INITIALIZED.get().is_some() {
        return Err(DashError::config("logging already initialized"));
    }

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cfg.level)
            .map_err(|err| DashError::config(format!("invalid log level {:?}: {err}", cfg.level)))?,
    };

    let installed = match cfg.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(
                tfmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_ansi(true),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tfmt::layer()
                    .json()
                    .with_timer(SystemTime)
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .try_init(),
    };
    installed.map_err(|err| DashError::config(format!("failed to set subscriber: {err}")))?;

    let _ = LOGGING_INITIALIZED.set(());
    tracing::info!(log_level = %cfg.level, log_format = %cfg.format, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn format_display_round_trips_through_from_str() {
        for format in [LogFormat::Pretty, LogFormat::Json] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
    }
}
