//! Log subscriber setup for the binary
//!
//! Library code only emits `tracing` events; `init` installs the stderr
//! subscriber once, at startup.

use tracing_subscriber::EnvFilter;

use crate::config::settings::LogFormat;

/// Filter directives override, e.g. `gnucash_books=debug`
pub const LOG_FILTER_ENV: &str = "GNUCASH_BOOKS_LOG";

/// Default filter for the given verbosity (`-v` count)
pub fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "gnucash_books=warn",
        1 => "gnucash_books=info",
        2 => "gnucash_books=debug",
        _ => "gnucash_books=trace",
    }
}

/// Parse a `--log-format` value (case-insensitive)
pub fn parse_format(s: &str) -> Option<LogFormat> {
    match s.trim().to_lowercase().as_str() {
        "human" | "text" => Some(LogFormat::Human),
        "json" => Some(LogFormat::Json),
        _ => None,
    }
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(verbose: u8, format: LogFormat) {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(std::io::stderr)
                .try_init()
                .ok();
        }
        LogFormat::Human => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .try_init()
                .ok();
        }
    }
}
