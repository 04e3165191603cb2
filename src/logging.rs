//! Logging utilities.
//!
//! Centralizes logger initialization on top of the `log` facade, plus a
//! small counter used for rate-limited diagnostics inside the frame loop.

use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "lumen=debug"). When absent, `RUST_LOG` is consulted, then `info`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once. Subsequent calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.write_style(config.write_style);

        // A test harness may already have installed a logger.
        if builder.try_init().is_err() {
            return;
        }

        log::debug!("logging initialized");
    });
}

/// Counts events and reports when one should be logged.
///
/// Used for chatty per-draw and per-glyph diagnostics: only every `period`th
/// event passes.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    period: u32,
    count: u32,
}

impl RateLimiter {
    #[must_use]
    pub const fn new(period: u32) -> Self {
        Self { period, count: 0 }
    }

    /// Records one event; returns `true` on every `period`th call.
    pub fn tick(&mut self) -> bool {
        self.count = self.count.wrapping_add(1);
        self.period != 0 && self.count % self.period == 0
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }
}
