//! The player registry: every player record and every player group.
//!
//! This is the explicit replacement for per-identity global player maps.
//! The host's session owner creates one registry and passes it to the
//! arena layer wherever player state is needed.
//!
//! # Lifecycle
//!
//! ```text
//! register() ──→ [bound to arena] ──→ release_arena() ──→ dispose()
//!                      ▲                    │
//!                      └────────────────────┘
//! ```
//!
//! # Groups
//!
//! A [`PlayerGroup`] is a set of players that queue together. A player is
//! in at most one group; joining a group leaves the previous one, and a
//! group is deleted as soon as its last member leaves.

use std::collections::HashMap;

use indexmap::IndexSet;
use skirmish_types::{ArenaId, ContextKind, GroupId, PlayerId, Team};

use crate::{Player, SessionError};

/// A set of players treated as one unit for queueing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerGroup {
    id: GroupId,
    members: IndexSet<PlayerId>,
}

impl PlayerGroup {
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Members in the order they joined.
    pub fn members(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.members.iter().copied()
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.members.contains(&player)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Owns every player record and player group known to the host.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, Player>,
    groups: HashMap<GroupId, PlayerGroup>,
    next_group: u64,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the record for a player who just connected.
    ///
    /// # Errors
    /// [`SessionError::AlreadyRegistered`] if a record already exists.
    pub fn register(
        &mut self,
        id: PlayerId,
        name: impl Into<String>,
    ) -> Result<&mut Player, SessionError> {
        if self.players.contains_key(&id) {
            return Err(SessionError::AlreadyRegistered(id));
        }
        let player = Player::new(id, name.into());
        tracing::info!(player = %id, name = player.name(), "player registered");
        Ok(self.players.entry(id).or_insert(player))
    }

    /// Deletes a player's record and takes them out of their group.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] if there is no record.
    /// - [`SessionError::StillInArena`] if the player is still bound to an
    ///   arena; remove them from it first.
    pub fn dispose(&mut self, id: PlayerId) -> Result<Player, SessionError> {
        let player = self.players.get(&id).ok_or(SessionError::NotFound(id))?;
        if let Some(arena) = player.arena() {
            return Err(SessionError::StillInArena(id, arena));
        }
        self.leave_group(id);
        let player = self.players.remove(&id).ok_or(SessionError::NotFound(id))?;
        tracing::info!(player = %id, "player disposed");
        Ok(player)
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Unbinds a player from their arena and clears their session state.
    /// Returns the team they held so the caller can recycle it.
    ///
    /// # Panics
    /// If the player is still a member of a context. Continuing would leave
    /// a roster entry pointing at a player who believes they are outside
    /// every arena.
    pub fn release_arena(&mut self, id: PlayerId) -> Result<Team, SessionError> {
        let player = self.players.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        assert_eq!(
            player.context(),
            ContextKind::None,
            "player {id} released from its arena while still in the {} context",
            player.context(),
        );
        let team = player.team();
        player.reset_session();
        Ok(team)
    }

    /// Drops every player's metadata for `arena`.
    pub fn clear_arena_metadata(&mut self, arena: ArenaId) {
        for player in self.players.values_mut() {
            player.meta.clear_arena(arena);
        }
    }

    // -- Groups -----------------------------------------------------------

    pub fn group(&self, id: GroupId) -> Option<&PlayerGroup> {
        self.groups.get(&id)
    }

    pub fn group_of(&self, player: PlayerId) -> Option<GroupId> {
        self.players.get(&player).and_then(Player::group)
    }

    /// Number of live groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Puts `player` in a brand-new group of their own.
    ///
    /// Returns `None` if the player is unknown.
    pub fn create_group(&mut self, player: PlayerId) -> Option<GroupId> {
        if !self.players.contains_key(&player) {
            return None;
        }
        self.next_group += 1;
        let id = GroupId(self.next_group);
        self.groups.insert(
            id,
            PlayerGroup {
                id,
                members: IndexSet::new(),
            },
        );
        self.join_group(player, id);
        Some(id)
    }

    /// Moves `player` into an existing group, leaving any previous one.
    ///
    /// Returns `false` if the player or the group is unknown.
    pub fn join_group(&mut self, player: PlayerId, group: GroupId) -> bool {
        if !self.players.contains_key(&player) || !self.groups.contains_key(&group) {
            return false;
        }
        if self.group_of(player) == Some(group) {
            return true;
        }
        self.leave_group(player);
        if let Some(g) = self.groups.get_mut(&group) {
            g.members.insert(player);
        }
        if let Some(p) = self.players.get_mut(&player) {
            p.set_group(Some(group));
        }
        tracing::debug!(%player, %group, "player joined group");
        true
    }

    /// Takes `player` out of their group, deleting the group if it is now
    /// empty. Returns the group they were in.
    pub fn leave_group(&mut self, player: PlayerId) -> Option<GroupId> {
        let group = self.group_of(player)?;
        if let Some(p) = self.players.get_mut(&player) {
            p.set_group(None);
        }
        let now_empty = match self.groups.get_mut(&group) {
            Some(g) => {
                g.members.shift_remove(&player);
                g.members.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.groups.remove(&group);
            tracing::debug!(%group, "group dissolved");
        }
        Some(group)
    }

    /// Puts every listed player in one fresh group. Unknown ids are skipped.
    pub fn party(&mut self, players: &[PlayerId]) -> Option<GroupId> {
        let known: Vec<PlayerId> = players
            .iter()
            .copied()
            .filter(|p| self.contains(*p))
            .collect();
        let (&leader, rest) = known.split_first()?;
        let group = self.create_group(leader)?;
        for &member in rest {
            self.join_group(member, group);
        }
        Some(group)
    }
}

// =========================================================================
// Tests
// =========================================================================
