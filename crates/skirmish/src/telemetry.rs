//! Logging setup for hosts embedding Skirmish.

use tracing_subscriber::EnvFilter;

use crate::SkirmishError;

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_directive` is used, e.g.
/// `"info"` or `"skirmish_arena=debug,info"`.
pub fn init_tracing(default_directive: &str) -> Result<(), SkirmishError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| SkirmishError::Telemetry(e.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| SkirmishError::Telemetry(e.to_string()))
}
