//! Arena manager: owns every arena and every player record, and routes
//! players between them.
//!
//! This is the entry point for the host. It enforces the cross-arena rule
//! the arenas cannot see on their own: a player is bound to at most one
//! arena at a time.

use std::sync::Arc;

use indexmap::IndexMap;
use skirmish_session::{Player, PlayerRegistry};
use skirmish_spawn::SpawnStore;
use skirmish_types::{
    ArenaId, ContextKind, EventBus, GroupId, JoinReason, LeaveReason,
    Listener, Notice, PlayerId, Spawnpoint, StartReason, Team,
};

use crate::{Arena, ArenaError, ArenaSettings, Removal, Winner, World};

pub struct ArenaManager {
    arenas: IndexMap<ArenaId, Arena>,
    players: PlayerRegistry,
    world: Box<dyn World>,
    store: Arc<dyn SpawnStore>,
    /// Listeners every new arena starts with.
    bus: EventBus,
}

impl ArenaManager {
    pub fn new(world: impl World, store: Arc<dyn SpawnStore>) -> Self {
        Self {
            arenas: IndexMap::new(),
            players: PlayerRegistry::new(),
            world: Box::new(world),
            store,
            bus: EventBus::new(),
        }
    }

    /// Adds a listener to every current and future arena.
    pub fn subscribe(&mut self, listener: Arc<dyn Listener>) {
        for arena in self.arenas.values_mut() {
            arena.subscribe(Arc::clone(&listener));
        }
        self.bus.subscribe(listener);
    }

    // -- Arenas -----------------------------------------------------------

    /// Creates an arena and loads its spawnpoints.
    pub fn create_arena(
        &mut self,
        name: impl Into<String>,
        settings: ArenaSettings,
    ) -> Result<ArenaId, ArenaError> {
        let id = ArenaId::random();
        let arena = Arena::new(id, name, settings, Arc::clone(&self.store), self.bus.clone())?;
        tracing::info!(arena = %id, name = arena.name(), spawns = arena.spawns().len(), "arena created");
        self.arenas.insert(id, arena);
        Ok(id)
    }

    /// Deletes an arena. Its players are removed, its stored spawnpoints
    /// and every player's metadata for it are deleted.
    pub fn remove_arena(&mut self, id: ArenaId) -> Result<(), ArenaError> {
        let mut arena = self
            .arenas
            .shift_remove(&id)
            .ok_or(ArenaError::NotFound(id))?;
        arena.purge(&mut self.players, &*self.world);
        tracing::info!(arena = %id, "arena deleted");
        Ok(())
    }

    pub fn arena(&self, id: ArenaId) -> Option<&Arena> {
        self.arenas.get(&id)
    }

    /// Mutable access, for per-arena listeners and admin flags.
    pub fn arena_mut(&mut self, id: ArenaId) -> Option<&mut Arena> {
        self.arenas.get_mut(&id)
    }

    pub fn arenas(&self) -> impl Iterator<Item = &Arena> {
        self.arenas.values()
    }

    pub fn arena_count(&self) -> usize {
        self.arenas.len()
    }

    fn arena_entry(&mut self, id: ArenaId) -> Result<&mut Arena, ArenaError> {
        self.arenas.get_mut(&id).ok_or(ArenaError::NotFound(id))
    }

    pub fn set_enabled(&mut self, id: ArenaId, enabled: bool) -> Result<(), ArenaError> {
        let arena = self.arenas.get_mut(&id).ok_or(ArenaError::NotFound(id))?;
        arena.set_enabled(&mut self.players, &*self.world, enabled);
        Ok(())
    }

    pub fn set_busy(&mut self, id: ArenaId, busy: bool) -> Result<(), ArenaError> {
        self.arena_entry(id)?.set_busy(busy);
        Ok(())
    }

    pub fn add_spawn(&mut self, id: ArenaId, spawn: Spawnpoint) -> Result<bool, ArenaError> {
        Ok(self.arena_entry(id)?.add_spawn(spawn))
    }

    pub fn remove_spawn(&mut self, id: ArenaId, name: &str) -> Result<bool, ArenaError> {
        Ok(self.arena_entry(id)?.remove_spawn(name))
    }

    // -- Players ----------------------------------------------------------

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// Mutable access to a player record, for metadata and host flags.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn register_player(&mut self, id: PlayerId, name: impl Into<String>) -> Result<(), ArenaError> {
        self.players.register(id, name)?;
        Ok(())
    }

    /// Removes a disconnecting player from their arena and deletes their
    /// record.
    pub fn dispose_player(&mut self, id: PlayerId) -> Result<(), ArenaError> {
        if let Some(arena) = self.arena_of(id) {
            let source = self.arenas.get_mut(&arena).ok_or(ArenaError::NotFound(arena))?;
            source.remove(&mut self.players, &*self.world, id, LeaveReason::Quit);
        }
        self.players.dispose(id)?;
        Ok(())
    }

    /// The arena a player is bound to.
    pub fn arena_of(&self, player: PlayerId) -> Option<ArenaId> {
        self.players.get(player).and_then(Player::arena)
    }

    /// The context a player occupies, looked up in their arena.
    pub fn context_of(&self, player: PlayerId) -> ContextKind {
        self.arena_of(player)
            .and_then(|id| self.arenas.get(&id))
            .map(|arena| arena.context_of(player))
            .unwrap_or_default()
    }

    fn bound_arena(&self, player: PlayerId) -> Result<ArenaId, ArenaError> {
        self.players
            .get(player)
            .ok_or(ArenaError::PlayerNotFound(player))?
            .arena()
            .ok_or(ArenaError::NotInArena(player))
    }

    /// Checks that `player` exists and is free to enter `arena`.
    fn admit(&self, player: PlayerId, arena: ArenaId) -> Result<(), ArenaError> {
        let record = self
            .players
            .get(player)
            .ok_or(ArenaError::PlayerNotFound(player))?;
        if let Some(current) = record.arena().filter(|a| *a != arena) {
            return Err(ArenaError::AlreadyInArena(player, current));
        }
        let target = self.arenas.get(&arena).ok_or(ArenaError::NotFound(arena))?;
        if !target.is_enabled() {
            return Err(ArenaError::Disabled(arena));
        }
        Ok(())
    }

    /// Puts a player in an arena's lobby.
    ///
    /// Returns `Ok(false)` if the join was vetoed or the player is already
    /// in this arena.
    pub fn join(&mut self, player: PlayerId, arena: ArenaId) -> Result<bool, ArenaError> {
        self.admit(player, arena)?;
        let target = self.arenas.get_mut(&arena).ok_or(ArenaError::NotFound(arena))?;
        Ok(target.join(&mut self.players, &*self.world, player, JoinReason::Join))
    }

    /// Joins the first enabled arena with no running game whose lobby
    /// accepts the player.
    pub fn join_any(&mut self, player: PlayerId) -> Result<Option<ArenaId>, ArenaError> {
        let candidates: Vec<ArenaId> = self
            .arenas
            .values()
            .filter(|a| a.is_enabled() && !a.game().is_running())
            .map(Arena::id)
            .collect();
        for arena in candidates {
            if self.join(player, arena)? {
                return Ok(Some(arena));
            }
        }
        Ok(None)
    }

    /// Removes a player from their arena.
    pub fn leave(&mut self, player: PlayerId, reason: LeaveReason) -> Result<Removal, ArenaError> {
        let arena = self.bound_arena(player)?;
        let source = self.arenas.get_mut(&arena).ok_or(ArenaError::NotFound(arena))?;
        Ok(source.remove(&mut self.players, &*self.world, player, reason))
    }

    /// Makes a player a spectator of `arena`.
    pub fn spectate(&mut self, player: PlayerId, arena: ArenaId) -> Result<bool, ArenaError> {
        self.admit(player, arena)?;
        let target = self.arenas.get_mut(&arena).ok_or(ArenaError::NotFound(arena))?;
        Ok(target.spectate(&mut self.players, &*self.world, player))
    }

    pub fn set_ready(&mut self, player: PlayerId, ready: bool) -> Result<bool, ArenaError> {
        let arena = self.bound_arena(player)?;
        let target = self.arenas.get_mut(&arena).ok_or(ArenaError::NotFound(arena))?;
        Ok(target.set_ready(&mut self.players, &*self.world, player, ready))
    }

    /// Puts the listed players in one group so they queue together.
    /// Players already in an arena cannot be regrouped.
    pub fn party(&mut self, members: &[PlayerId]) -> Result<Option<GroupId>, ArenaError> {
        for member in members {
            let record = self
                .players
                .get(*member)
                .ok_or(ArenaError::PlayerNotFound(*member))?;
            if let Some(arena) = record.arena() {
                return Err(ArenaError::AlreadyInArena(*member, arena));
            }
        }
        Ok(self.players.party(members))
    }

    // -- Games ------------------------------------------------------------

    pub fn start_game(&mut self, arena: ArenaId, reason: StartReason) -> Result<bool, ArenaError> {
        let target = self.arenas.get_mut(&arena).ok_or(ArenaError::NotFound(arena))?;
        Ok(target.start_game(&mut self.players, &*self.world, reason))
    }

    pub fn end_game(&mut self, arena: ArenaId) -> Result<bool, ArenaError> {
        let target = self.arenas.get_mut(&arena).ok_or(ArenaError::NotFound(arena))?;
        Ok(target.end_game(&mut self.players, &*self.world))
    }

    pub fn set_winner(&mut self, arena: ArenaId, winner: Winner) -> Result<bool, ArenaError> {
        let target = self.arenas.get_mut(&arena).ok_or(ArenaError::NotFound(arena))?;
        Ok(target.set_winner(&mut self.players, &*self.world, winner))
    }

    pub fn set_loser(&mut self, arena: ArenaId, team: Team) -> Result<bool, ArenaError> {
        let target = self.arenas.get_mut(&arena).ok_or(ArenaError::NotFound(arena))?;
        Ok(target.set_loser(&mut self.players, &*self.world, team))
    }

    pub fn eliminate(&mut self, player: PlayerId) -> Result<bool, ArenaError> {
        let arena = self.bound_arena(player)?;
        let target = self.arenas.get_mut(&arena).ok_or(ArenaError::NotFound(arena))?;
        Ok(target.eliminate(&mut self.players, &*self.world, player))
    }

    pub fn lose_life(&mut self, player: PlayerId) -> Result<Option<u32>, ArenaError> {
        let arena = self.bound_arena(player)?;
        let target = self.arenas.get_mut(&arena).ok_or(ArenaError::NotFound(arena))?;
        Ok(target.lose_life(&mut self.players, &*self.world, player))
    }

    /// Moves a game player to another arena: into its game if one is
    /// running, its lobby otherwise.
    ///
    /// The two halves are separate transitions. If the target refuses the
    /// player after they left the source, they end up outside every arena
    /// and `Ok(false)` is returned; nothing is rolled back.
    pub fn forward_player(&mut self, player: PlayerId, to: ArenaId) -> Result<bool, ArenaError> {
        let from = self.bound_arena(player)?;
        if !self.arenas.contains_key(&to) {
            return Err(ArenaError::NotFound(to));
        }

        let source = self.arenas.get_mut(&from).ok_or(ArenaError::NotFound(from))?;
        if !source
            .forward_out(&mut self.players, &*self.world, player)
            .is_removed()
        {
            return Ok(false);
        }

        let target = self.arenas.get_mut(&to).ok_or(ArenaError::NotFound(to))?;
        let joined = target.accept_forwarded(&mut self.players, &*self.world, player);
        if !joined {
            tracing::warn!(%player, %from, %to, "forwarded player refused by target, now outside every arena");
            return Ok(false);
        }

        tracing::info!(%player, %from, %to, "player forwarded");
        if let Some(source) = self.arenas.get(&from) {
            source.bus().notify(Notice::Forwarded { from, to, player });
        }
        Ok(true)
    }

    /// Advances every lobby countdown by one second. Returns how many games
    /// started.
    pub fn tick_lobbies(&mut self) -> usize {
        let mut started = 0;
        for arena in self.arenas.values_mut() {
            if arena.tick_countdown(&mut self.players, &*self.world) {
                started += 1;
            }
        }
        started
    }
}

impl std::fmt::Debug for ArenaManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArenaManager")
            .field("arenas", &self.arenas.len())
            .field("players", &self.players.len())
            .finish()
    }
}
