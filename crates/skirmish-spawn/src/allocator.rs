//! Spawnpoint registry and reservation table.
//!
//! The allocator exclusively owns an arena's spawnpoints. A point is either
//! **live** (selectable by any query) or **reserved** (held by exactly one
//! player and invisible to every query until released).
//!
//! ```text
//!           reserve(p, s)
//!   live ─────────────────→ reserved by p
//!     ▲                         │
//!     └─── unreserve(p) ────────┘
//!          clear_reserved()
//! ```
//!
//! Every mutation is first offered to the arena's [`EventBus`]; a veto
//! leaves the allocator untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use rand::seq::IndexedRandom;
use skirmish_types::{
    ArenaId, EventBus, Notice, PlayerId, Proposal, SpawnKind, Spawnpoint, Team,
};

use crate::{SpawnError, SpawnStore};

/// Picks a uniformly random point of `kind` that accepts `team`.
///
/// Returns `None` when nothing matches; callers treat that as "no spawn
/// available", not as a failure.
pub fn pick_random<'a, I>(points: I, kind: &SpawnKind, team: Team) -> Option<&'a Spawnpoint>
where
    I: IntoIterator<Item = &'a Spawnpoint>,
{
    let candidates: Vec<&Spawnpoint> = points
        .into_iter()
        .filter(|p| p.matches(kind, team))
        .collect();
    candidates.choose(&mut rand::rng()).copied()
}

/// Owns one arena's spawnpoints and the player → spawnpoint reservations.
pub struct SpawnAllocator {
    arena: ArenaId,
    points: IndexMap<String, Spawnpoint>,
    /// Player → name of the point they hold.
    reservations: HashMap<PlayerId, String>,
    /// Names of every held point, kept in sync with `reservations`.
    held: HashSet<String>,
    store: Arc<dyn SpawnStore>,
}

impl SpawnAllocator {
    /// Creates the allocator for `arena`, loading its stored spawnpoints.
    ///
    /// # Errors
    /// Propagates the store's error if the stored data cannot be read.
    pub fn load(arena: ArenaId, store: Arc<dyn SpawnStore>) -> Result<Self, SpawnError> {
        let points: IndexMap<String, Spawnpoint> = store
            .load(arena)?
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        tracing::debug!(%arena, spawns = points.len(), "spawnpoints loaded");
        Ok(Self {
            arena,
            points,
            reservations: HashMap::new(),
            held: HashSet::new(),
            store,
        })
    }

    pub fn arena(&self) -> ArenaId {
        self.arena
    }

    // -- Registry ---------------------------------------------------------

    /// Registers and persists a new spawnpoint.
    ///
    /// Returns `false` if a point with the same name exists or the addition
    /// was vetoed.
    pub fn add(&mut self, bus: &EventBus, spawn: Spawnpoint) -> bool {
        if self.points.contains_key(&spawn.name) {
            return false;
        }
        if !bus.review(&Proposal::AddSpawn {
            arena: self.arena,
            spawn: &spawn,
        }) {
            return false;
        }
        if let Err(e) = self.store.save(self.arena, &spawn) {
            tracing::warn!(arena = %self.arena, spawn = %spawn.name, error = %e, "failed to persist spawnpoint");
        }
        tracing::debug!(arena = %self.arena, spawn = %spawn.name, kind = %spawn.kind, team = %spawn.team, "spawnpoint added");
        self.points.insert(spawn.name.clone(), spawn.clone());
        bus.notify(Notice::SpawnAdded {
            arena: self.arena,
            spawn,
        });
        true
    }

    /// Unregisters a spawnpoint and deletes it from storage. A reservation
    /// on it is dropped with it.
    ///
    /// Returns `false` if no such point exists or the removal was vetoed.
    pub fn remove(&mut self, bus: &EventBus, name: &str) -> bool {
        let Some(spawn) = self.points.get(name) else {
            return false;
        };
        if !bus.review(&Proposal::RemoveSpawn {
            arena: self.arena,
            spawn,
        }) {
            return false;
        }
        self.points.shift_remove(name);
        if self.held.remove(name) {
            self.reservations.retain(|_, held| held != name);
            tracing::debug!(arena = %self.arena, spawn = name, "reserved spawnpoint removed, reservation dropped");
        }
        if let Err(e) = self.store.remove(self.arena, name) {
            tracing::warn!(arena = %self.arena, spawn = name, error = %e, "failed to delete stored spawnpoint");
        }
        bus.notify(Notice::SpawnRemoved {
            arena: self.arena,
            name: name.to_string(),
        });
        true
    }

    /// Deletes every stored spawnpoint of this arena. Used when the arena
    /// itself is deleted; no notifications are sent.
    pub fn purge(&mut self) {
        self.points.clear();
        self.reservations.clear();
        self.held.clear();
        if let Err(e) = self.store.purge(self.arena) {
            tracing::warn!(arena = %self.arena, error = %e, "failed to purge stored spawnpoints");
        }
    }

    /// Looks up a point by name, reserved or not.
    pub fn get(&self, name: &str) -> Option<&Spawnpoint> {
        self.points.get(name)
    }

    /// Total number of registered points, reserved ones included.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of points currently selectable.
    pub fn live_count(&self) -> usize {
        self.points.len() - self.held.len()
    }

    /// Distinct assignable teams referenced by any registered point, in
    /// registration order.
    pub fn teams(&self) -> Vec<Team> {
        let mut seen = Vec::new();
        for point in self.points.values() {
            if point.team.is_assignable() && !seen.contains(&point.team) {
                seen.push(point.team);
            }
        }
        seen
    }

    // -- Queries ----------------------------------------------------------

    /// Lobby queries fall back to game points when no lobby point exists.
    fn effective_kind<'k>(&self, kind: &'k SpawnKind) -> &'k SpawnKind {
        const GAME: &SpawnKind = &SpawnKind::Game;
        if *kind == SpawnKind::Lobby && !self.points.values().any(|p| p.kind == SpawnKind::Lobby) {
            GAME
        } else {
            kind
        }
    }

    fn live(&self) -> impl Iterator<Item = &Spawnpoint> {
        self.points
            .values()
            .filter(|p| !self.held.contains(&p.name))
    }

    /// Every live point of `kind`.
    pub fn all(&self, kind: &SpawnKind) -> Vec<&Spawnpoint> {
        let kind = self.effective_kind(kind);
        self.live().filter(|p| &p.kind == kind).collect()
    }

    /// Every live point of `kind` that accepts `team`.
    pub fn all_for(&self, team: Team, kind: &SpawnKind) -> Vec<&Spawnpoint> {
        let kind = self.effective_kind(kind);
        self.live().filter(|p| p.matches(kind, team)).collect()
    }

    /// A random live point of `kind` for `team`, or `None` if there is none.
    pub fn random_for(&self, kind: &SpawnKind, team: Team) -> Option<Spawnpoint> {
        let kind = self.effective_kind(kind);
        pick_random(self.live(), kind, team).cloned()
    }

    // -- Reservations -----------------------------------------------------

    /// Gives `player` exclusive use of the live point `name`.
    ///
    /// Returns `false` if the point is unknown or already held, if the
    /// player already holds a point (release it first), or if vetoed.
    pub fn reserve(&mut self, bus: &EventBus, player: PlayerId, name: &str) -> bool {
        if self.reservations.contains_key(&player) || self.held.contains(name) {
            return false;
        }
        let Some(spawn) = self.points.get(name) else {
            return false;
        };
        if !bus.review(&Proposal::Reserve {
            arena: self.arena,
            player,
            spawn,
        }) {
            return false;
        }
        self.reservations.insert(player, name.to_string());
        self.held.insert(name.to_string());
        tracing::debug!(arena = %self.arena, %player, spawn = name, "spawnpoint reserved");
        bus.notify(Notice::Reserved {
            arena: self.arena,
            player,
            spawn: name.to_string(),
        });
        true
    }

    /// Returns the point held by `player` to the live pool.
    ///
    /// Returns `false` if the player holds nothing or the release was
    /// vetoed; a vetoed release keeps the reservation in place.
    pub fn unreserve(&mut self, bus: &EventBus, player: PlayerId) -> bool {
        let Some(name) = self.reservations.get(&player) else {
            return false;
        };
        let Some(spawn) = self.points.get(name) else {
            return false;
        };
        if !bus.review(&Proposal::Unreserve {
            arena: self.arena,
            player,
            spawn,
        }) {
            return false;
        }
        let Some(name) = self.reservations.remove(&player) else {
            return false;
        };
        self.held.remove(&name);
        tracing::debug!(arena = %self.arena, %player, spawn = %name, "spawnpoint released");
        bus.notify(Notice::Unreserved {
            arena: self.arena,
            player,
            spawn: name,
        });
        true
    }

    /// Returns every held point to the live pool.
    ///
    /// Returns `false` if vetoed, in which case nothing is released.
    pub fn clear_reserved(&mut self, bus: &EventBus) -> bool {
        let count = self.reservations.len();
        if !bus.review(&Proposal::ClearReserved {
            arena: self.arena,
            count,
        }) {
            return false;
        }
        self.reservations.clear();
        self.held.clear();
        if count > 0 {
            tracing::debug!(arena = %self.arena, count, "reservations cleared");
        }
        bus.notify(Notice::ReservationsCleared {
            arena: self.arena,
            count,
        });
        true
    }

    /// The point held by `player`, if any.
    pub fn reserved_by(&self, player: PlayerId) -> Option<&Spawnpoint> {
        self.reservations
            .get(&player)
            .and_then(|name| self.points.get(name))
    }

    /// Returns `true` if the point `name` is currently held.
    pub fn is_reserved(&self, name: &str) -> bool {
        self.held.contains(name)
    }

    /// Number of active reservations.
    pub fn reservation_count(&self) -> usize {
        self.reservations.len()
    }
}

impl std::fmt::Debug for SpawnAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnAllocator")
            .field("arena", &self.arena)
            .field("points", &self.points.len())
            .field("reservations", &self.reservations)
            .finish()
    }
}
