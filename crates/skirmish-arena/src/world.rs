//! The host world, as seen by the arena layer.
//!
//! Moving entities and talking to players are host operations. Arenas call
//! them through [`World`] and never look behind it.

use skirmish_types::{Location, PlayerId};

/// Why a player is being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeleportCause {
    /// Entering a context.
    Join,
    /// Leaving the arena, to its fallback location.
    Leave,
}

/// Host operations the arena layer invokes.
pub trait World: Send + Sync + 'static {
    /// Moves a player. Returns `false` if the host refused or failed.
    fn teleport(&self, player: PlayerId, to: &Location, cause: TeleportCause) -> bool;

    /// Shows a message to a player.
    fn tell(&self, _player: PlayerId, _message: &str) {}
}

/// A world that accepts every teleport and discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWorld;

impl World for NullWorld {
    fn teleport(&self, _player: PlayerId, _to: &Location, _cause: TeleportCause) -> bool {
        true
    }
}
