//! Error types for the session layer.

use skirmish_types::{ArenaId, PlayerId};

/// Errors that can occur while managing player records.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A record already exists for this identity. A player can only be
    /// registered once.
    #[error("player {0} is already registered")]
    AlreadyRegistered(PlayerId),

    /// No record exists for the given player.
    #[error("player {0} not found")]
    NotFound(PlayerId),

    /// The player is still bound to an arena and must leave it first.
    #[error("player {0} is still in arena {1}")]
    StillInArena(PlayerId, ArenaId),
}
