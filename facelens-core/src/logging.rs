//! File logging for facelens
//!
//! Records go to `$XDG_STATE_HOME/facelens/facelens.log.<date>`. The
//! configured level applies to the facelens crates only; the HTTP stack is
//! held at `warn` so request plumbing does not drown out workflow events.
//! `RUST_LOG` replaces the whole filter when set.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_PREFIX: &str = "facelens.log";

/// Crates whose records are filtered by the configured level
const OWN_TARGETS: [&str; 2] = ["facelens_core", "facelens"];

/// Filter directives for a configured level, e.g. `warn,facelens_core=debug,facelens=debug`
fn directives(level: &str) -> String {
    let level = match level.trim().to_ascii_lowercase().as_str() {
        l @ ("trace" | "debug" | "info" | "warn" | "error" | "off") => l.to_string(),
        // Unknown names fall back to info
        _ => "info".to_string(),
    };

    let mut parts = vec!["warn".to_string()];
    parts.extend(OWN_TARGETS.iter().map(|t| format!("{t}={level}")));
    parts.join(",")
}

/// Start writing logs to the state directory.
///
/// Hold the returned guard until exit; dropping it flushes buffered records.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    std::fs::create_dir_all(&log_dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .max_log_files(config.max_files.max(1))
        .build(&log_dir)
        .map_err(|e| Error::Config(format!("cannot open log in {}: {}", log_dir.display(), e)))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(&config.level)));

    // Already-initialized is fine: the first subscriber keeps receiving
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init();

    tracing::info!(dir = %log_dir.display(), level = %config.level, "facelens logging started");

    Ok(LoggingGuard { _worker: guard })
}

/// Route records to the test harness output, filtered by `RUST_LOG`
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Keeps the background log writer alive
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_applies_to_own_crates_only() {
        assert_eq!(
            directives("debug"),
            "warn,facelens_core=debug,facelens=debug"
        );
    }

    #[test]
    fn level_is_normalized() {
        assert_eq!(directives(" INFO "), "warn,facelens_core=info,facelens=info");
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(directives("chatty"), "warn,facelens_core=info,facelens=info");
    }
}
