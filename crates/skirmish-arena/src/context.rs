//! The context protocol shared by lobby, game and spectator.
//!
//! A player is in at most one context of at most one arena. Every move in
//! or out goes through [`add_player`] / [`remove_player`], which run the
//! same guarded sequence for all three contexts and call back into the
//! concrete context only for what differs (spawn kind, entry side effects,
//! exit side effects):
//!
//! ```text
//!  add:    guard → review Join → track + bind → on_enter → candidate spawn
//!          → place (listeners may rewrite) → Joined → teleport → reserve → tell
//!
//!  remove: guard → review Leave → before → unreserve → untrack → after
//!          → [leaving arena: teleport to fallback, release] → Left
//! ```
//!
//! Moves between contexts of the same arena use the relation-change
//! reasons, which skip the veto: the surrounding operation was already
//! approved. Removals cascading from a game end or an arena disable skip
//! it too.

use skirmish_session::{Player, PlayerRegistry};
use skirmish_spawn::{SpawnAllocator, TeamDistributor};
use skirmish_types::{
    ArenaId, ContextKind, EventBus, JoinReason, LeaveReason, Location, Notice,
    Placement, PlayerId, Proposal, SpawnKind,
};

use crate::{ArenaSettings, Membership, TeleportCause, World};

// ---------------------------------------------------------------------------
// Env
// ---------------------------------------------------------------------------

/// Everything a context needs from its arena and the host for one
/// operation. Built by [`Arena`](crate::Arena) from disjoint borrows of its
/// own fields plus the host's registry and world.
pub struct Env<'a> {
    pub(crate) arena: ArenaId,
    pub(crate) enabled: bool,
    /// The arena's own flag; set while a start moves players.
    pub(crate) busy: &'a mut bool,
    pub(crate) settings: &'a ArenaSettings,
    pub(crate) spawns: &'a mut SpawnAllocator,
    pub(crate) teams: &'a mut TeamDistributor,
    pub(crate) bus: &'a EventBus,
    pub(crate) world: &'a dyn World,
    pub(crate) players: &'a mut PlayerRegistry,
}

impl Env<'_> {
    pub fn arena(&self) -> ArenaId {
        self.arena
    }

    pub fn settings(&self) -> &ArenaSettings {
        self.settings
    }

    pub fn players(&self) -> &PlayerRegistry {
        self.players
    }
}

// ---------------------------------------------------------------------------
// Removal
// ---------------------------------------------------------------------------

/// Outcome of removing a player from a context.
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    /// The player was not in the context.
    NotPresent,
    /// A listener vetoed the removal; nothing changed.
    Cancelled,
    /// The player was removed. `fallback` is where they were sent if they
    /// left the arena.
    Removed { fallback: Option<Location> },
}

impl Removal {
    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }

    pub fn fallback(&self) -> Option<&Location> {
        match self {
            Self::Removed { fallback } => fallback.as_ref(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ContextManager
// ---------------------------------------------------------------------------

/// A mutually-exclusive role players can hold within an arena.
pub trait ContextManager {
    /// This context's slice of the arena settings.
    type Settings;

    fn kind(&self) -> ContextKind;

    fn membership(&self) -> &Membership;

    fn settings<'s>(&self, arena: &'s ArenaSettings) -> &'s Self::Settings;

    /// Adds a player. Returns `false` if they are already here, the arena
    /// is disabled, the player is busy elsewhere, or the join was vetoed.
    fn add_player(&mut self, env: &mut Env<'_>, player: PlayerId, reason: JoinReason) -> bool;

    /// Removes a player.
    fn remove_player(&mut self, env: &mut Env<'_>, player: PlayerId, reason: LeaveReason) -> Removal;

    fn contains(&self, player: PlayerId) -> bool {
        self.membership().contains(player)
    }

    fn players(&self) -> Vec<PlayerId> {
        self.membership().players().collect()
    }

    fn len(&self) -> usize {
        self.membership().len()
    }

    fn is_empty(&self) -> bool {
        self.membership().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Shared orchestration
// ---------------------------------------------------------------------------

/// What differs between contexts when a player enters.
pub(crate) struct Entry {
    pub kind: ContextKind,
    /// Spawnpoint type the candidate location is drawn from.
    pub spawn: SpawnKind,
    /// Reserve the spawnpoint the player lands on.
    pub reserve: bool,
}

/// Runs the add sequence. `on_enter` applies the context's side effects to
/// the player once the join is approved and tracked.
pub(crate) fn add_player<F>(
    members: &mut Membership,
    env: &mut Env<'_>,
    player: PlayerId,
    reason: JoinReason,
    entry: Entry,
    on_enter: F,
) -> bool
where
    F: FnOnce(&mut Player, &mut TeamDistributor),
{
    let arena = env.arena;
    let kind = entry.kind;

    if members.contains(player) || !env.enabled {
        return false;
    }
    let Some(record) = env.players.get(player) else {
        tracing::debug!(%arena, %player, "join ignored, unknown player");
        return false;
    };
    if record.arena().is_some_and(|a| a != arena) || record.context() != ContextKind::None {
        tracing::debug!(%arena, %player, current = %record.context(), "join ignored, player is elsewhere");
        return false;
    }

    if !reason.is_relation_change()
        && !env.bus.review(&Proposal::Join {
            arena,
            player,
            context: kind,
            reason,
        })
    {
        return false;
    }

    members.add(env.players, player, env.settings.max_players);
    let Some(record) = env.players.get_mut(player) else {
        return false;
    };
    record.bind_arena(arena);
    record.set_context(kind);
    on_enter(record, &mut *env.teams);
    let team = record.team();

    let spawn = env.spawns.random_for(&entry.spawn, team);
    if spawn.is_none() {
        tracing::warn!(%arena, %player, %team, spawn_kind = %entry.spawn, "no spawnpoint available");
    }
    let placement = env.bus.place(Placement {
        arena,
        player,
        context: kind,
        reason,
        location: spawn.as_ref().map(|s| s.location.clone()),
        spawn,
        message: None,
    });

    env.bus.notify(Notice::Joined {
        arena,
        player,
        context: kind,
        location: placement.location.clone(),
    });
    tracing::debug!(%arena, %player, context = %kind, ?reason, "player entered context");

    if let Some(location) = &placement.location {
        if env.world.teleport(player, location, TeleportCause::Join) {
            if let (true, Some(spawn)) = (entry.reserve, &placement.spawn) {
                env.spawns.reserve(env.bus, player, &spawn.name);
            }
        } else {
            tracing::warn!(%arena, %player, %location, "teleport failed");
        }
    }
    if let Some(message) = &placement.message {
        env.world.tell(player, message);
    }
    true
}

/// Runs the remove sequence. `before` runs once the removal is approved;
/// `after` runs once the player is untracked and returns the fallback
/// location.
pub(crate) fn remove_player<B, A>(
    members: &mut Membership,
    env: &mut Env<'_>,
    player: PlayerId,
    reason: LeaveReason,
    kind: ContextKind,
    before: B,
    after: A,
) -> Removal
where
    B: FnOnce(&mut Env<'_>, PlayerId),
    A: FnOnce(&mut Env<'_>, PlayerId) -> Option<Location>,
{
    let arena = env.arena;

    if !members.contains(player) {
        return Removal::NotPresent;
    }
    if reason.is_vetoable()
        && !env.bus.review(&Proposal::Leave {
            arena,
            player,
            context: kind,
            reason,
        })
    {
        return Removal::Cancelled;
    }

    before(&mut *env, player);

    if env.spawns.reserved_by(player).is_some() && !env.spawns.unreserve(env.bus, player) {
        tracing::warn!(%arena, %player, "spawn release vetoed, reservation kept");
    }

    members.remove(env.players, player, reason);
    if let Some(record) = env.players.get_mut(player) {
        record.set_context(ContextKind::None);
    }

    let fallback = after(&mut *env, player);

    if reason.leaves_arena() {
        if reason != LeaveReason::Forwarding {
            if let Some(location) = &fallback {
                if !env.world.teleport(player, location, TeleportCause::Leave) {
                    tracing::warn!(%arena, %player, %location, "teleport failed");
                }
            }
        }
        match env.players.release_arena(player) {
            Ok(team) => env.teams.recycle(team),
            Err(e) => tracing::warn!(%arena, %player, error = %e, "release failed"),
        }
    }

    env.bus.notify(Notice::Left {
        arena,
        player,
        context: kind,
        reason,
        fallback: fallback.clone(),
    });
    tracing::debug!(%arena, %player, context = %kind, ?reason, "player left context");

    Removal::Removed { fallback }
}
