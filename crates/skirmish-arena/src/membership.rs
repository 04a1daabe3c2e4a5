//! Per-context membership and group tracking.
//!
//! Each context owns a [`Membership`]: the players it currently holds and
//! the set of *active* groups, i.e. groups with at least one tracked member.
//! Group records themselves live in the
//! [`PlayerRegistry`]; the tracker only decides which of them matter here.
//!
//! Group queries read player ready flags from the registry and are cached
//! per minimum size until the next membership change or
//! [`invalidate`](Membership::invalidate).

use std::collections::HashMap;

use indexmap::IndexSet;
use skirmish_session::PlayerRegistry;
use skirmish_types::{GroupId, LeaveReason, PlayerId};

#[derive(Debug, Default)]
pub struct Membership {
    players: IndexSet<PlayerId>,
    active: IndexSet<GroupId>,
    ready_cache: HashMap<usize, Vec<PlayerId>>,
    next_cache: HashMap<usize, Vec<PlayerId>>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.players.contains(&player)
    }

    /// Tracked players in the order they were added.
    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Groups with at least one tracked member, in activation order.
    pub fn active_groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.active.iter().copied()
    }

    /// Starts tracking `player` and activates their group.
    ///
    /// A player who already has a group brings it along. Otherwise they
    /// join the first active group smaller than `max_group`, or a new group
    /// of their own.
    ///
    /// Returns `false` if the player was already tracked.
    pub fn add(&mut self, players: &mut PlayerRegistry, player: PlayerId, max_group: usize) -> bool {
        if !self.players.insert(player) {
            return false;
        }

        let group = match players.group_of(player) {
            Some(group) => Some(group),
            None => {
                let open = self.active.iter().copied().find(|g| {
                    players.group(*g).is_some_and(|grp| grp.len() < max_group)
                });
                match open {
                    Some(group) if players.join_group(player, group) => Some(group),
                    _ => players.create_group(player),
                }
            }
        };
        if let Some(group) = group {
            self.active.insert(group);
            tracing::trace!(%player, %group, "group activated");
        }

        self.invalidate();
        true
    }

    /// Stops tracking `player`.
    ///
    /// Unless `reason` keeps the group intact (a move between contexts or
    /// arenas), the player also leaves their group. Their group drops out
    /// of the active set once none of its members is tracked here.
    ///
    /// Returns `false` if the player was not tracked.
    pub fn remove(&mut self, players: &mut PlayerRegistry, player: PlayerId, reason: LeaveReason) -> bool {
        if !self.players.shift_remove(&player) {
            return false;
        }

        let group = players.group_of(player);
        if !reason.keeps_group() {
            players.leave_group(player);
        }
        if let Some(group) = group {
            let still_tracked = players
                .group(group)
                .is_some_and(|grp| grp.members().any(|m| self.players.contains(&m)));
            if !still_tracked {
                self.active.shift_remove(&group);
                tracing::trace!(%group, "group deactivated");
            }
        }

        self.invalidate();
        true
    }

    /// Drops cached group results. Call after any ready flag changes.
    pub fn invalidate(&mut self) {
        self.ready_cache.clear();
        self.next_cache.clear();
    }

    /// Tracked members of `group`, in group order.
    fn present(&self, players: &PlayerRegistry, group: GroupId) -> Vec<PlayerId> {
        players
            .group(group)
            .map(|grp| grp.members().filter(|m| self.players.contains(m)).collect())
            .unwrap_or_default()
    }

    /// The first active group whose tracked members are all ready and
    /// number at least `min_size`. Empty if no group qualifies.
    pub fn ready_group(&mut self, players: &PlayerRegistry, min_size: usize) -> Vec<PlayerId> {
        if let Some(cached) = self.ready_cache.get(&min_size) {
            return cached.clone();
        }
        let found = self
            .active
            .iter()
            .map(|g| self.present(players, *g))
            .find(|members| {
                !members.is_empty()
                    && members.len() >= min_size
                    && members
                        .iter()
                        .all(|m| players.get(*m).is_some_and(|p| p.is_ready()))
            })
            .unwrap_or_default();
        self.ready_cache.insert(min_size, found.clone());
        found
    }

    /// The first active group with at least `min_size` tracked members,
    /// ready or not.
    ///
    /// Falls back to any ready group, whatever its size, so a group that
    /// split across arenas still gets to play eventually.
    pub fn next_group(&mut self, players: &PlayerRegistry, min_size: usize) -> Vec<PlayerId> {
        if let Some(cached) = self.next_cache.get(&min_size) {
            return cached.clone();
        }
        let sized = self
            .active
            .iter()
            .map(|g| self.present(players, *g))
            .find(|members| !members.is_empty() && members.len() >= min_size);
        let found = match sized {
            Some(members) => members,
            None => self.ready_group(players, 1),
        };
        self.next_cache.insert(min_size, found.clone());
        found
    }
}
