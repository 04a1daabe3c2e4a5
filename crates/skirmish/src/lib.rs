//! # Skirmish
//!
//! Arena session orchestration for competitive game servers.
//!
//! Players queue in an arena's lobby, are grouped and moved into a running
//! game, and move again to spectator or back out when they lose or the
//! game ends. Skirmish tracks which context every player is in, hands out
//! spawnpoints and teams, and drives the game start/end state machine.
//! The host supplies the world (teleports, messages) and listens on each
//! arena's notification bus.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! # fn main() -> Result<(), SkirmishError> {
//! let mut host = Host::builder().tick_rate(20).build();
//! let arena = host.arenas_mut().create_arena("dust", ArenaSettings::default())?;
//! let player = PlayerId::random();
//! host.arenas_mut().register_player(player, "alice")?;
//! host.arenas_mut().join(player, arena)?;
//! # Ok(())
//! # }
//! ```

mod error;
mod host;
pub mod telemetry;

pub use error::SkirmishError;
pub use host::{Host, HostBuilder, HostConfig};

/// Re-exports the types most hosts need.
pub mod prelude {
    pub use crate::{Host, HostBuilder, HostConfig, SkirmishError};

    pub use skirmish_arena::{
        Arena, ArenaError, ArenaManager, ArenaSettings, ContextManager,
        GameOverPolicy, GameSettings, LobbySettings, NullWorld, Removal,
        SpectatorSettings, TeleportCause, Winner, World,
    };
    pub use skirmish_session::{Player, PlayerRegistry, SessionError};
    pub use skirmish_spawn::{JsonSpawnStore, SpawnError, SpawnStore};
    pub use skirmish_tick::{Scheduler, TaskHandle, TickClock, TickConfig};
    pub use skirmish_types::{
        ArenaId, ContextKind, EventBus, GroupId, JoinReason, LeaveReason,
        Listener, Location, Notice, Placement, PlayerId, Proposal, SpawnKind,
        Spawnpoint, StartReason, StartRequest, Team, Verdict,
    };
}
