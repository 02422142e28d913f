//! Subscriber setup for binaries and test harnesses.
//!
//! Library code only emits `tracing` events; installing a subscriber is the
//! embedding program's call.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::ConfigError;

/// Build the filter: `RUST_LOG` when set, the configured level otherwise.
pub fn filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| ConfigError::Invalid(format!("logging.level {:?}: {e}", config.level))),
    }
}

/// Install a global fmt subscriber.
///
/// Fails if the level is not a valid filter or a subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<(), ConfigError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter(config)?)
        .with_target(true)
        .try_init()
        .map_err(|e| ConfigError::Invalid(format!("logging already initialized: {e}")))
}
