//! Arena session orchestration for Skirmish.
//!
//! An [`Arena`] holds players in three mutually-exclusive contexts:
//!
//! ```text
//!            join                 start(reason)             eliminate
//!   outside ──────→ Lobby ───────────────────────→ Game ─────────────→ Spectator
//!      ▲              │                              │                     │
//!      └──────────────┴──── leave / game ended ──────┴─────────────────────┘
//! ```
//!
//! # Key types
//!
//! - [`ArenaManager`]: owns every arena and player record; the host's entry point
//! - [`Arena`]: one game session container
//! - [`ContextManager`]: the protocol shared by [`Lobby`], [`Game`] and [`Spectator`]
//! - [`Membership`]: per-context player and group tracking
//! - [`ArenaSettings`]: per-arena configuration
//! - [`World`]: host operations (teleport, messages) the arenas invoke

mod arena;
mod context;
mod error;
mod game;
mod lobby;
mod manager;
mod membership;
mod settings;
mod spectator;
mod world;

pub use arena::Arena;
pub use context::{ContextManager, Env, Removal};
pub use error::ArenaError;
pub use game::{Game, Winner};
pub use lobby::{Countdown, Lobby};
pub use manager::ArenaManager;
pub use membership::Membership;
pub use settings::{
    ArenaSettings, GameOverPolicy, GameSettings, LobbySettings,
    SpectatorSettings,
};
pub use spectator::Spectator;
pub use world::{NullWorld, TeleportCause, World};
