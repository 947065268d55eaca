//! Subscriber setup for processes embedding the runtime.

use tracing::info;

use crate::config::{ConfigError, RuntimeConfig};

/// Install a global fmt subscriber filtered by `config.log_filter`.
///
/// Returns `Ok(false)` when a global subscriber was already installed;
/// the existing one is left in place.
pub fn init_tracing(config: &RuntimeConfig) -> Result<bool, ConfigError> {
    let filter = config.env_filter()?;
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok();
    if installed {
        info!(filter = %config.log_filter, "tracing initialised");
    }
    Ok(installed)
}
