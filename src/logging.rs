//! Structured logging setup using the `tracing` ecosystem.
//!
//! Configures a `tracing-subscriber` with either JSON output (for batch
//! jobs whose logs are shipped somewhere) or pretty-printed output (for
//! a terminal). Format is auto-detected from stdout but can be forced
//! via `--json` or `--pretty`. Filtering uses a `Targets` filter: one
//! level for this crate, `warn` for the HTTP stack.

use tracing_subscriber::filter::Targets;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::LogLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[must_use]
pub fn resolve_format(pretty: bool, json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else if pretty || std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        LogFormat::Pretty
    } else {
        LogFormat::Json
    }
}

#[must_use]
pub fn filter(level: &LogLevel) -> Targets {
    Targets::new()
        .with_default(tracing::Level::WARN)
        .with_target(env!("CARGO_CRATE_NAME"), level.to_tracing_level())
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(level: &LogLevel, format: LogFormat) {
    let filter = filter(level);

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false))
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn json_flag_wins() {
        assert_eq!(resolve_format(false, true), LogFormat::Json);
    }

    #[test]
    fn pretty_flag_forces_pretty() {
        assert_eq!(resolve_format(true, false), LogFormat::Pretty);
    }

    #[test]
    fn crate_level_follows_flag_and_deps_stay_quiet() {
        let targets = filter(&LogLevel::Debug);
        assert!(targets.would_enable("note_dispatch::dispatch", &Level::DEBUG));
        assert!(!targets.would_enable("hyper_util::client", &Level::INFO));
        assert!(targets.would_enable("hyper_util::client", &Level::WARN));
    }
}
