//! Structured logging setup
//!
//! Filter directives come from `PRESS_LOG`, then `RUST_LOG`, then a default of
//! `info` (`debug` for the framework itself in development). Output is pretty
//! in development and one JSON object per line in production.

use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

fn default_directives(debug: bool) -> &'static str {
    if debug {
        "info,press=debug"
    } else {
        "info"
    }
}

/// Build the filter from `PRESS_LOG`, falling back to `RUST_LOG`
pub fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env("PRESS_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)))
}

/// Install the global subscriber
///
/// Safe to call more than once; only the first call installs anything.
pub fn init(format: LogFormat, debug: bool) {
    let registry = tracing_subscriber::registry().with(env_filter(debug));

    let installed = match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(%format, "logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(LogFormat::Pretty, true);
        init(LogFormat::Json, false);
    }
}
