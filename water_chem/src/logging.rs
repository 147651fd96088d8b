/// Structured logging for the water chemistry report.
///
/// Log events are emitted with `tracing` macros and carry a `stage` field
/// (`daily`, `monthly`, `system`) plus zone/period context. This module
/// installs the subscriber (console on stderr, optional append-mode log
/// file) and classifies monthly report failures.

use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{EnvFilter, Layer, fmt as tracing_fmt, prelude::*};

use crate::model::{DocumentUnreadable, UnreadableCause};

/// Environment variable checked before `RUST_LOG` for a filter directive.
pub const LOG_ENV_VAR: &str = "WATER_CHEM_LOG";

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.directive().to_uppercase())
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the month's report is not published yet
    Expected,
    /// Unexpected failure - server trouble, network trouble, or a timeout
    Unexpected,
    /// Unknown - a document arrived but could not be decoded
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classify why a monthly report could not be read.
pub fn classify_period_failure(cause: &UnreadableCause) -> FailureType {
    match cause {
        // Unpublished months answer 404, or 200 with an HTML page.
        UnreadableCause::Status(404) | UnreadableCause::Status(410) | UnreadableCause::NotPdf => {
            FailureType::Expected
        }
        UnreadableCause::Status(code) if *code >= 500 => FailureType::Unexpected,
        UnreadableCause::Status(_) => FailureType::Unknown,
        UnreadableCause::Transport(_) => FailureType::Unexpected,
        UnreadableCause::Decode(_) => FailureType::Unknown,
    }
}

/// Log an unreadable period. Every cause is recoverable, so all of them log
/// at debug; the classification is attached for filtering.
pub fn log_period_failure(err: &DocumentUnreadable) {
    let failure = classify_period_failure(&err.cause);
    debug!(
        stage = "monthly",
        period = %err.period,
        failure = %failure,
        "skipping period: {}",
        err.cause
    );
}

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file: {0}")]
    File(#[from] std::io::Error),
    #[error("logger already initialised: {0}")]
    Init(String),
}

/// Install the global subscriber.
///
/// `WATER_CHEM_LOG` or `RUST_LOG`, if set, override `min_level`. When
/// `log_file` is given, events are also appended there without ANSI colour.
pub fn init_logging(
    min_level: LogLevel,
    log_file: Option<&Path>,
    console_timestamps: bool,
) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(min_level.directive()));

    let console = if console_timestamps {
        tracing_fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    } else {
        tracing_fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .boxed()
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tracing_fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::ReportPeriod;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parses_from_config_strings() {
        #[derive(Deserialize)]
        struct Wrapper {
            level: LogLevel,
        }
        let w: Wrapper = toml::from_str("level = \"warning\"").unwrap();
        assert_eq!(w.level, LogLevel::Warn);
        let w: Wrapper = toml::from_str("level = \"debug\"").unwrap();
        assert_eq!(w.level, LogLevel::Debug);
    }

    #[test]
    fn test_failure_classification() {
        assert_eq!(classify_period_failure(&UnreadableCause::Status(404)), FailureType::Expected);
        assert_eq!(classify_period_failure(&UnreadableCause::NotPdf), FailureType::Expected);
        assert_eq!(classify_period_failure(&UnreadableCause::Status(503)), FailureType::Unexpected);
        assert_eq!(
            classify_period_failure(&UnreadableCause::Transport("operation timed out".into())),
            FailureType::Unexpected
        );
        assert_eq!(classify_period_failure(&UnreadableCause::Status(403)), FailureType::Unknown);
        assert_eq!(
            classify_period_failure(&UnreadableCause::Decode("bad xref".into())),
            FailureType::Unknown
        );
    }

    #[test]
    fn test_log_period_failure_without_subscriber_is_silent() {
        log_period_failure(&DocumentUnreadable {
            period: ReportPeriod::new(2024, 4),
            cause: UnreadableCause::Status(404),
        });
    }
}
