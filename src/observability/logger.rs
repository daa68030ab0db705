//! Logging setup
//!
//! Installs a `tracing-subscriber` fmt layer filtered by `RUST_LOG`, falling
//! back to the configured level. Installation is idempotent: a second call
//! (common in tests) leaves the first subscriber in place.

use tracing_subscriber::EnvFilter;

/// Default filter directive when neither `RUST_LOG` nor a level is given
pub const DEFAULT_LEVEL: &str = "info";

/// Build the filter for a configured level
pub fn env_filter(level: &str) -> EnvFilter {
    let level = if level.trim().is_empty() {
        DEFAULT_LEVEL
    } else {
        level
    };
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(level: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_logging("debug");
        assert!(!init_logging("debug"));
    }

    #[test]
    fn test_bad_level_falls_back() {
        // Must not panic on garbage directives
        let _ = env_filter("=!=");
        let _ = env_filter("");
    }
}
