//! Logging and tracing initialization.

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` wins over the configured level when set. Double
/// initialization is tolerated so tests can call this freely.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    if config.json {
        fmt()
            .with_env_filter(env_filter)
            .json()
            .try_init()
            .ok();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .try_init()
            .ok();
    }
}

/// Initialize logging with defaults (useful for tests and quick scripts).
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}
