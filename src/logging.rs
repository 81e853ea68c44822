//! Tracing subscriber setup for the binaries

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG` when set, otherwise from the configured level
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()))
}

/// Install the global subscriber.
///
/// Returns false if one was already installed (tests, repeated calls).
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = env_filter(config);
    let result = if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
    };
    result.is_ok()
}
