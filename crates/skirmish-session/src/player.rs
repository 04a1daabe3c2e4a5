//! Player records: the data the arena layer keeps about each player.
//!
//! A record tracks:
//! - WHO the player is (`PlayerId`, display name)
//! - WHERE they are (bound arena, cached context)
//! - HOW they are doing (team, lives, points, readiness, status flags)
//! - WHAT collaborators attached to them (three metadata stores)

use std::collections::HashMap;

use serde_json::Value;
use skirmish_types::{ArenaId, ContextKind, GroupId, PlayerId, Team};

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// A key-value store of arbitrary JSON values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaStore {
    values: HashMap<String, Value>,
}

impl MetaStore {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Stores a value, returning the previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The three independent metadata stores of a player.
///
/// - `global` lives as long as the player record.
/// - `session` is cleared whenever the player leaves an arena.
/// - per-arena stores are cleared when their arena is deleted.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub global: MetaStore,
    pub session: MetaStore,
    arenas: HashMap<ArenaId, MetaStore>,
}

impl Metadata {
    /// The store attached to `arena`, if anything was ever written to it.
    pub fn arena(&self, arena: ArenaId) -> Option<&MetaStore> {
        self.arenas.get(&arena)
    }

    /// The store attached to `arena`, created on first use.
    pub fn arena_mut(&mut self, arena: ArenaId) -> &mut MetaStore {
        self.arenas.entry(arena).or_default()
    }

    pub(crate) fn clear_arena(&mut self, arena: ArenaId) {
        self.arenas.remove(&arena);
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player known to the host.
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    name: String,
    arena: Option<ArenaId>,
    context: ContextKind,
    team: Team,
    ready: bool,
    group: Option<GroupId>,

    /// Remaining lives in the current game.
    pub lives: u32,
    /// Points scored in the current game.
    pub points: i64,
    /// Points scored across every game since registration.
    pub total_points: i64,
    /// The host should keep this player from moving.
    pub immobilized: bool,
    /// The host should cancel damage dealt to this player.
    pub invulnerable: bool,

    pub meta: Metadata,
}

impl Player {
    pub(crate) fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            arena: None,
            context: ContextKind::None,
            team: Team::None,
            ready: false,
            group: None,
            lives: 0,
            points: 0,
            total_points: 0,
            immobilized: false,
            invulnerable: false,
            meta: Metadata::default(),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The arena this player is bound to, if any.
    pub fn arena(&self) -> Option<ArenaId> {
        self.arena
    }

    /// Binds the player to an arena. Returns `false` if they are already
    /// bound to a different one.
    pub fn bind_arena(&mut self, arena: ArenaId) -> bool {
        match self.arena {
            Some(current) if current != arena => false,
            _ => {
                self.arena = Some(arena);
                true
            }
        }
    }

    /// Cached copy of the context this player occupies.
    ///
    /// The arena's containment lookup is the authority; this cache is only
    /// written by the context add/remove orchestration.
    pub fn context(&self) -> ContextKind {
        self.context
    }

    /// Updates the cached context. Only context managers call this.
    pub fn set_context(&mut self, context: ContextKind) {
        self.context = context;
    }

    pub fn team(&self) -> Team {
        self.team
    }

    /// Changes the player's team. Returns `false` (and does nothing) if the
    /// player is already on `team`.
    pub fn set_team(&mut self, team: Team) -> bool {
        if self.team == team {
            return false;
        }
        self.team = team;
        true
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Sets the ready flag. Returns `true` if it changed.
    pub fn set_ready(&mut self, ready: bool) -> bool {
        let changed = self.ready != ready;
        self.ready = ready;
        changed
    }

    /// The group this player queues with, if any.
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub(crate) fn set_group(&mut self, group: Option<GroupId>) {
        self.group = group;
    }

    /// Adds to both the per-game and lifetime point totals.
    pub fn award(&mut self, points: i64) {
        self.points += points;
        self.total_points += points;
    }

    /// Clears everything tied to the arena the player just left.
    pub(crate) fn reset_session(&mut self) {
        self.arena = None;
        self.team = Team::None;
        self.ready = false;
        self.lives = 0;
        self.points = 0;
        self.immobilized = false;
        self.invulnerable = false;
        self.meta.session.clear();
    }
}
