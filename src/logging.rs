//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for the filter:
//! 1. `--log-level` CLI flag
//! 2. `SIZING_LOG` environment variable (any `EnvFilter` directive)
//! 3. `warn`
//!
//! Logs go to stderr so stdout stays clean for command output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "SIZING_LOG";

/// Initialise the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<&str>) {
    let filter = cli_level
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_ENV).ok())
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}
