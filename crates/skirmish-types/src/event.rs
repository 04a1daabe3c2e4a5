//! The notification bus.
//!
//! Every state-changing operation first offers a [`Proposal`] to the
//! arena's listeners; any listener may veto it, and a veto aborts the
//! operation before anything is mutated. Completed operations are announced
//! with a [`Notice`].
//!
//! Two operations let listeners rewrite the outcome instead of just
//! vetoing it. Each is an explicit value passed through the listener chain
//! and returned, rather than a shared mutable event object:
//!
//! - [`Placement`]: where a player who just entered a context is sent, and
//!   what message they see.
//! - [`StartRequest`]: which lobby players are pulled into a starting game.

use std::fmt;
use std::sync::Arc;

use crate::{
    ArenaId, ContextKind, JoinReason, LeaveReason, Location, PlayerId,
    Spawnpoint, StartReason, Team,
};

// ---------------------------------------------------------------------------
// Proposals (cancellable pre-notifications)
// ---------------------------------------------------------------------------

/// An operation about to happen. Listeners answer with a [`Verdict`].
#[derive(Debug, Clone, Copy)]
pub enum Proposal<'a> {
    Join {
        arena: ArenaId,
        player: PlayerId,
        context: ContextKind,
        reason: JoinReason,
    },
    Leave {
        arena: ArenaId,
        player: PlayerId,
        context: ContextKind,
        reason: LeaveReason,
    },
    AddSpawn {
        arena: ArenaId,
        spawn: &'a Spawnpoint,
    },
    RemoveSpawn {
        arena: ArenaId,
        spawn: &'a Spawnpoint,
    },
    Reserve {
        arena: ArenaId,
        player: PlayerId,
        spawn: &'a Spawnpoint,
    },
    Unreserve {
        arena: ArenaId,
        player: PlayerId,
        spawn: &'a Spawnpoint,
    },
    ClearReserved {
        arena: ArenaId,
        count: usize,
    },
}

/// A listener's answer to a [`Proposal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Allow,
    Deny,
}

// ---------------------------------------------------------------------------
// Rewritable outcomes
// ---------------------------------------------------------------------------

/// Where a player who just entered a context goes.
///
/// The context fills in its candidate spawn; listeners may relocate the
/// player, attach a message, or suppress the teleport by clearing
/// `location`.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub arena: ArenaId,
    pub player: PlayerId,
    pub context: ContextKind,
    pub reason: JoinReason,
    /// The spawnpoint the location came from, if any. Only a placement that
    /// still carries its spawnpoint is eligible for reservation.
    pub spawn: Option<Spawnpoint>,
    pub location: Option<Location>,
    pub message: Option<String>,
}

impl Placement {
    /// Sends the player somewhere other than the candidate spawnpoint.
    pub fn relocate(&mut self, location: Location) {
        self.spawn = None;
        self.location = Some(location);
    }

    /// Keeps the player where they are.
    pub fn suppress(&mut self) {
        self.spawn = None;
        self.location = None;
    }
}

/// The candidate set for a game start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub arena: ArenaId,
    pub reason: StartReason,
    pub candidates: Vec<PlayerId>,
    pub cancelled: bool,
}

// ---------------------------------------------------------------------------
// Notices (post-notifications)
// ---------------------------------------------------------------------------

/// Something that happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Joined {
        arena: ArenaId,
        player: PlayerId,
        context: ContextKind,
        location: Option<Location>,
    },
    Left {
        arena: ArenaId,
        player: PlayerId,
        context: ContextKind,
        reason: LeaveReason,
        fallback: Option<Location>,
    },
    SpawnAdded {
        arena: ArenaId,
        spawn: Spawnpoint,
    },
    SpawnRemoved {
        arena: ArenaId,
        name: String,
    },
    Reserved {
        arena: ArenaId,
        player: PlayerId,
        spawn: String,
    },
    Unreserved {
        arena: ArenaId,
        player: PlayerId,
        spawn: String,
    },
    ReservationsCleared {
        arena: ArenaId,
        count: usize,
    },
    Ready {
        arena: ArenaId,
        player: PlayerId,
        ready: bool,
    },
    CountdownTick {
        arena: ArenaId,
        remaining: u32,
    },
    CountdownCancelled {
        arena: ArenaId,
    },
    GameStarted {
        arena: ArenaId,
        reason: StartReason,
        players: Vec<PlayerId>,
    },
    GameEnded {
        arena: ArenaId,
    },
    PlayerWon {
        arena: ArenaId,
        player: PlayerId,
    },
    PlayerLost {
        arena: ArenaId,
        player: PlayerId,
    },
    TeamWon {
        arena: ArenaId,
        team: Team,
    },
    TeamLost {
        arena: ArenaId,
        team: Team,
    },
    Forwarded {
        from: ArenaId,
        to: ArenaId,
        player: PlayerId,
    },
}

// ---------------------------------------------------------------------------
// Listener + bus
// ---------------------------------------------------------------------------

/// An external collaborator observing (and optionally steering) arenas.
///
/// Every method has a pass-through default, so implementors only override
/// what they care about. Listeners run synchronously on the orchestration
/// thread and must not block.
pub trait Listener: Send + Sync + 'static {
    /// Vetoes or allows a pending operation.
    fn review(&self, _proposal: &Proposal<'_>) -> Verdict {
        Verdict::Allow
    }

    /// Rewrites where a player entering a context is sent.
    fn place(&self, placement: Placement) -> Placement {
        placement
    }

    /// Trims or cancels the candidate set of a starting game.
    fn review_start(&self, request: StartRequest) -> StartRequest {
        request
    }

    /// Observes a completed operation.
    fn notify(&self, _notice: &Notice) {}
}

/// An ordered chain of listeners. Cheap to clone: listeners are shared.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Vec<Arc<dyn Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener to the end of the chain.
    pub fn subscribe(&mut self, listener: Arc<dyn Listener>) {
        self.listeners.push(listener);
    }

    /// Number of subscribed listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Offers a proposal to every listener. Returns `false` as soon as one
    /// of them denies it.
    pub fn review(&self, proposal: &Proposal<'_>) -> bool {
        let denied = self
            .listeners
            .iter()
            .any(|l| l.review(proposal) == Verdict::Deny);
        if denied {
            tracing::debug!(?proposal, "proposal vetoed");
        }
        !denied
    }

    /// Passes a placement through the chain, in subscription order.
    pub fn place(&self, placement: Placement) -> Placement {
        self.listeners
            .iter()
            .fold(placement, |acc, l| l.place(acc))
    }

    /// Passes a start request through the chain. Stops at the first
    /// listener that cancels it.
    pub fn review_start(&self, mut request: StartRequest) -> StartRequest {
        for listener in &self.listeners {
            request = listener.review_start(request);
            if request.cancelled {
                tracing::debug!(arena = %request.arena, "game start vetoed");
                break;
            }
        }
        request
    }

    /// Announces a completed operation to every listener.
    pub fn notify(&self, notice: Notice) {
        for listener in &self.listeners {
            listener.notify(&notice);
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
