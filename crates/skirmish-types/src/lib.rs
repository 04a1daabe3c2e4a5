//! Shared vocabulary for Skirmish.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - **Identity** ([`PlayerId`], [`ArenaId`], [`GroupId`])
//! - **World values** ([`Location`], [`Team`], [`Spawnpoint`], [`SpawnKind`])
//! - **Contexts** ([`ContextKind`]) and the reasons players move between
//!   them ([`JoinReason`], [`LeaveReason`], [`StartReason`])
//! - **Notifications** ([`EventBus`], [`Listener`], [`Proposal`], [`Notice`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Arena layer (contexts, arena manager)
//!     ↕
//! Session layer (player registry) + Spawn layer (allocator, teams)
//!     ↕
//! Types (this crate)  ← ids, spawnpoints, notification bus
//! ```

mod context;
mod event;
mod ids;
mod world;

pub use context::{ContextKind, JoinReason, LeaveReason, StartReason};
pub use event::{
    EventBus, Listener, Notice, Placement, Proposal, StartRequest, Verdict,
};
pub use ids::{ArenaId, GroupId, PlayerId};
pub use world::{Location, SpawnKind, Spawnpoint, Team};
