//! Tracing setup
//!
//! `RUST_LOG` wins over the configured filter. Installing twice is harmless:
//! the second call reports that a subscriber was already present.

use crate::config::HeadergenConfig;
use crate::error::{HeadergenError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber
///
/// Returns `true` if this call installed it, `false` if a global subscriber
/// already existed.
///
/// # Errors
/// Returns `HeadergenError::Config` if `RUST_LOG` is unset and the
/// configured filter does not parse.
pub fn init_tracing(config: &HeadergenConfig) -> Result<bool> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter).map_err(|e| {
            HeadergenError::Config(format!("invalid log filter '{}': {e}", config.log_filter))
        })?,
    };

    let installed = if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    };
    Ok(installed)
}
