//! Diagnostic configuration for the broker binary.
//!
//! The broker's request contract has no flags and no behavioural settings.
//! Only the stderr diagnostics can be tuned, through two environment
//! variables that never influence stdout or the exit status.
//!
//! Both variables sit outside the invocation contract. The payload alone
//! determines the response line and exit status, so a broker started with an
//! empty environment differs only in what it writes to stderr.

use strum::{Display, EnumString};

/// Environment variable holding the `tracing` filter directive.
pub const LOG_FILTER_ENV: &str = "PHANTOM_BROKER_LOG";

/// Environment variable selecting the diagnostic output format.
pub const LOG_FORMAT_ENV: &str = "PHANTOM_BROKER_LOG_FORMAT";

/// Filter applied when [`LOG_FILTER_ENV`] is unset or blank.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Supported diagnostic output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Human-readable single line output.
    #[default]
    Compact,
    /// Structured JSON, one object per event.
    Json,
}

/// Resolved diagnostic settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    log_filter: String,
    log_format: LogFormat,
    rejected_log_format: Option<String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            log_filter: String::from(DEFAULT_LOG_FILTER),
            log_format: LogFormat::default(),
            rejected_log_format: None,
        }
    }
}

impl BrokerConfig {
    /// Reads settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an injected lookup.
    ///
    /// An unrecognised format value falls back to the default and is kept
    /// so telemetry can report it once a subscriber is installed.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(filter) = lookup(LOG_FILTER_ENV).filter(|value| !value.trim().is_empty()) {
            config.log_filter = filter;
        }

        if let Some(raw) = lookup(LOG_FORMAT_ENV) {
            match raw.trim().parse::<LogFormat>() {
                Ok(format) => config.log_format = format,
                Err(_) => config.rejected_log_format = Some(raw),
            }
        }

        config
    }

    /// Returns the `tracing` filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the diagnostic output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the format value that failed to parse, if any.
    #[must_use]
    pub fn rejected_log_format(&self) -> Option<&str> {
        self.rejected_log_format.as_deref()
    }
}
