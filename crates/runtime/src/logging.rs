//! Tracing subscriber setup for the server and the CLI.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the configured
//! level. `LOG_FORMAT` overrides the configured output format the same way.

use narrator_core::{LoggingConfig, NarratorError};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan, prelude::*};

/// Environment variable overriding `[logging] format`.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event, fields flattened to the top level.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = NarratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(NarratorError::config(format!("unknown log format: {other}"))),
        }
    }
}

/// Pick the output format: a valid `env_value` wins over the config value.
///
/// Unparseable values are skipped; the second element names the first one
/// rejected so it can be reported once a subscriber exists.
pub fn resolve_format(configured: &str, env_value: Option<&str>) -> (LogFormat, Option<String>) {
    let mut rejected = None;
    for candidate in env_value.into_iter().chain(Some(configured)) {
        match candidate.parse() {
            Ok(format) => return (format, rejected),
            Err(_) => {
                rejected.get_or_insert_with(|| candidate.to_string());
            }
        }
    }
    (LogFormat::default(), rejected)
}

/// Install the global subscriber.
///
/// Returns `false` when one was already installed; that call changes nothing.
pub fn init_logging(level: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let text = (format == LogFormat::Text).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
    });
    let json = (format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .try_init()
        .is_ok()
}

/// Install the subscriber described by `[logging]`, honouring `LOG_FORMAT`.
pub fn init_logging_from_config(config: &LoggingConfig) -> bool {
    let env_value = std::env::var(LOG_FORMAT_ENV).ok();
    let (format, rejected) = resolve_format(&config.format, env_value.as_deref());
    let installed = init_logging(&config.level, format);
    if let Some(value) = rejected {
        tracing::warn!(value = %value, ?format, "Ignoring unknown log format");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" JSON ".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(NarratorError::Config(_))
        ));
    }

    #[test]
    fn test_env_format_overrides_config() {
        assert_eq!(resolve_format("text", Some("json")), (LogFormat::Json, None));
        assert_eq!(resolve_format("json", None), (LogFormat::Json, None));
    }

    #[test]
    fn test_bad_format_falls_through() {
        assert_eq!(
            resolve_format("json", Some("yaml")),
            (LogFormat::Json, Some("yaml".to_string()))
        );
        assert_eq!(
            resolve_format("nope", None),
            (LogFormat::Text, Some("nope".to_string()))
        );
    }

    #[test]
    fn test_second_init_is_ignored() {
        init_logging_from_config(&LoggingConfig::default());
        assert!(!init_logging("debug", LogFormat::Json));
        tracing::info!("logging initialised");
    }
}
