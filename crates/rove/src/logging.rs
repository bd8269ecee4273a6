//! Log levels and, with the `logging` feature, a ready-made subscriber.
//!
//! The library itself only emits `tracing` events. Applications embedding
//! rove either install their own subscriber or call `init_logging`.

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing::level_filters::LevelFilter;

/// How much of the build to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging output
    Silent,
    /// Only errors
    Error,
    /// Errors and warnings, including build diagnostics
    Warn,
    /// Errors, warnings, and the build summary (default)
    #[default]
    Info,
    /// Per-phase and per-module progress
    Debug,
    /// Everything, including dedup hits and externals
    Trace,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Whether events at `level` pass this level.
    pub fn enables(&self, level: Level) -> bool {
        level <= self.level_filter()
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Silent => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.to_ascii_lowercase().as_str() {
            "silent" | "off" | "none" => LogLevel::Silent,
            "error" => LogLevel::Error,
            "warn" | "warning" => LogLevel::Warn,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            other => return Err(format!("unknown log level '{other}'")),
        };
        Ok(level)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter())
    }
}

#[cfg(feature = "logging")]
mod subscriber {
    use std::sync::Once;

    use tracing::level_filters::LevelFilter;
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    use super::LogLevel;

    static INIT: Once = Once::new();

    /// Install a compact stderr subscriber at `level`.
    ///
    /// `RUST_LOG` directives still apply on top of `level`. Only the first
    /// call in a process installs the subscriber.
    ///
    /// ```rust,no_run
    /// use rove::logging::{init_logging, LogLevel};
    ///
    /// init_logging(LogLevel::Info);
    /// ```
    pub fn init_logging(level: LogLevel) {
        INIT.call_once(|| install(level.level_filter()));
    }

    /// Install the subscriber with `RUST_LOG` alone deciding what is shown,
    /// `info` when it is unset.
    pub fn init_logging_from_env() {
        INIT.call_once(|| install(LevelFilter::INFO));
    }

    fn install(default: LevelFilter) {
        let filter = EnvFilter::builder()
            .with_default_directive(default.into())
            .from_env_lossy();

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_target(false).without_time())
            .try_init();
    }
}

#[cfg(feature = "logging")]
pub use subscriber::{init_logging, init_logging_from_env};
