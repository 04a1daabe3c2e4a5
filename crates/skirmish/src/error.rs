//! Unified error type for Skirmish.

use skirmish_arena::ArenaError;
use skirmish_session::SessionError;
use skirmish_spawn::SpawnError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attributes let `?` convert sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// Unknown arena or player, or a player bound elsewhere.
    #[error(transparent)]
    Arena(#[from] ArenaError),

    /// Player record lifecycle.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Spawnpoint persistence.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// The tracing subscriber could not be installed.
    #[error("telemetry setup failed: {0}")]
    Telemetry(String),
}
