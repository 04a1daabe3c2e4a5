//! Spawnpoints and teams for Skirmish.
//!
//! - [`SpawnAllocator`]: an arena's spawnpoint registry plus the table of
//!   exclusive player reservations
//! - [`TeamDistributor`]: balanced team assignment for joining players
//! - [`SpawnStore`]: where spawnpoints are persisted ([`JsonSpawnStore`])

mod allocator;
mod error;
mod store;
mod teams;

pub use allocator::{SpawnAllocator, pick_random};
pub use error::SpawnError;
pub use store::{JsonSpawnStore, SpawnStore};
pub use teams::TeamDistributor;
