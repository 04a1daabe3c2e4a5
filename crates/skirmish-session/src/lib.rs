//! Player records for Skirmish.
//!
//! This crate owns the state the arena layer keeps about each player:
//!
//! 1. **Records**: identity, team, lives, points, readiness and status
//!    flags ([`Player`])
//! 2. **Metadata**: global, per-session and per-arena key-value stores
//!    ([`Metadata`])
//! 3. **Groups**: players that queue together ([`PlayerGroup`])
//!
//! All of it lives in one [`PlayerRegistry`] owned by the host session,
//! passed by reference to whoever needs it. There are no process-wide maps.

mod error;
mod player;
mod registry;

pub use error::SessionError;
pub use player::{MetaStore, Metadata, Player};
pub use registry::{PlayerGroup, PlayerRegistry};
