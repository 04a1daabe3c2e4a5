//! Contexts and the reasons players move between them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The mutually-exclusive role a player holds within an arena.
///
/// A player's context is derived by asking each context manager in the
/// fixed order of [`ContextKind::PRIORITY`]; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContextKind {
    Lobby,
    Game,
    Spectator,
    #[default]
    None,
}

impl ContextKind {
    /// Lookup order used when deriving a player's context.
    pub const PRIORITY: [ContextKind; 3] = [Self::Lobby, Self::Game, Self::Spectator];
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::Game => write!(f, "game"),
            Self::Spectator => write!(f, "spectator"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Why a player is being added to a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinReason {
    /// The player asked to join.
    Join,
    /// An administrator placed the player.
    Admin,
    /// Moved between contexts of the same arena (lobby to game, game to
    /// spectator). No pre-join veto is offered.
    RelationChange,
    /// Arrived from another arena's game.
    Forwarded,
}

impl JoinReason {
    pub fn is_relation_change(&self) -> bool {
        matches!(self, Self::RelationChange)
    }
}

/// Why a player is being removed from a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveReason {
    /// The player asked to leave.
    Leave,
    /// The player disconnected from the host.
    Quit,
    /// An administrator removed the player.
    Kick,
    /// The player lost (eliminated, or their team lost).
    Lose,
    /// The game ended while the player was still in it.
    GameEnded,
    /// The arena was disabled or deleted.
    Disabled,
    /// Moved to another context of the same arena.
    RelationChange,
    /// Moved to another arena.
    Forwarding,
}

impl LeaveReason {
    pub fn is_relation_change(&self) -> bool {
        matches!(self, Self::RelationChange)
    }

    /// Returns `true` if listeners may veto this removal. Relation changes
    /// were approved by the surrounding move; game-end and disable
    /// cascades run after the state change and must complete.
    pub fn is_vetoable(&self) -> bool {
        !matches!(self, Self::RelationChange | Self::GameEnded | Self::Disabled)
    }

    /// Returns `true` if the player's group membership survives this removal.
    pub fn keeps_group(&self) -> bool {
        matches!(self, Self::RelationChange | Self::Forwarding)
    }

    /// Returns `true` if this removal takes the player out of the arena.
    pub fn leaves_arena(&self) -> bool {
        !self.is_relation_change()
    }

    /// Returns `true` for removals that may end a running game.
    pub fn is_terminal(&self) -> bool {
        !self.keeps_group()
    }
}

/// What triggered a game start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartReason {
    /// The lobby's auto-start threshold and countdown.
    Auto,
    /// Every member of a lobby group signalled readiness.
    PlayersReady,
    /// An administrator forced the start.
    Admin,
}
