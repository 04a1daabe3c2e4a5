//! Error types for the arena layer.

use skirmish_session::SessionError;
use skirmish_spawn::SpawnError;
use skirmish_types::{ArenaId, PlayerId};

/// Errors raised at the arena manager boundary.
///
/// Vetoed or no-op transitions are not errors; they come back as `false`
/// or as a [`Removal`](crate::Removal). These variants cover unknown ids
/// and requests that make no sense for the player's current binding.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// The arena does not exist.
    #[error("arena {0} not found")]
    NotFound(ArenaId),

    /// No player record exists for this id.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// The player is bound to another arena and must leave it first.
    #[error("player {0} already in arena {1}")]
    AlreadyInArena(PlayerId, ArenaId),

    /// The player is not in any arena.
    #[error("player {0} is not in an arena")]
    NotInArena(PlayerId),

    /// The arena is disabled and accepts no players.
    #[error("arena {0} is disabled")]
    Disabled(ArenaId),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),
}
