//! The arena: composition root for one game session container.
//!
//! An arena owns its three contexts, its spawn allocator and its team
//! distributor. Player records and the host world are not owned here;
//! every operation that touches players borrows the host's
//! [`PlayerRegistry`] and [`World`] for its duration.

use std::sync::Arc;

use skirmish_session::PlayerRegistry;
use skirmish_spawn::{SpawnAllocator, SpawnError, SpawnStore, TeamDistributor};
use skirmish_types::{
    ArenaId, ContextKind, EventBus, JoinReason, LeaveReason, Listener, Notice,
    PlayerId, Spawnpoint, StartReason, Team,
};

use crate::context::Env;
use crate::lobby::Countdown;
use crate::{
    ArenaSettings, ContextManager, Game, Lobby, Removal, Spectator, Winner,
    World,
};

/// The split borrow every operation works on.
struct Parts<'a> {
    env: Env<'a>,
    lobby: &'a mut Lobby,
    game: &'a mut Game,
    spectator: &'a mut Spectator,
}

pub struct Arena {
    id: ArenaId,
    name: String,
    enabled: bool,
    busy: bool,
    settings: ArenaSettings,
    spawns: SpawnAllocator,
    teams: TeamDistributor,
    bus: EventBus,
    lobby: Lobby,
    game: Game,
    spectator: Spectator,
}

impl Arena {
    /// Creates an enabled arena, loading its spawnpoints from `store`.
    pub fn new(
        id: ArenaId,
        name: impl Into<String>,
        settings: ArenaSettings,
        store: Arc<dyn SpawnStore>,
        bus: EventBus,
    ) -> Result<Self, SpawnError> {
        let spawns = SpawnAllocator::load(id, store)?;
        let teams = TeamDistributor::new(spawns.teams());
        Ok(Self {
            id,
            name: name.into(),
            enabled: true,
            busy: false,
            settings: settings.validated(),
            spawns,
            teams,
            bus,
            lobby: Lobby::new(),
            game: Game::new(),
            spectator: Spectator::new(),
        })
    }

    fn parts<'a>(&'a mut self, players: &'a mut PlayerRegistry, world: &'a dyn World) -> Parts<'a> {
        Parts {
            env: Env {
                arena: self.id,
                enabled: self.enabled,
                busy: &mut self.busy,
                settings: &self.settings,
                spawns: &mut self.spawns,
                teams: &mut self.teams,
                bus: &self.bus,
                world,
                players,
            },
            lobby: &mut self.lobby,
            game: &mut self.game,
            spectator: &mut self.spectator,
        }
    }

    // -- Accessors --------------------------------------------------------

    pub fn id(&self) -> ArenaId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &ArenaSettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// An arena is busy while a transition is in flight, or while the host
    /// holds it (for example during a map reset).
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Adds a listener to this arena only.
    pub fn subscribe(&mut self, listener: Arc<dyn Listener>) {
        self.bus.subscribe(listener);
    }

    pub fn spawns(&self) -> &SpawnAllocator {
        &self.spawns
    }

    pub fn teams(&self) -> &TeamDistributor {
        &self.teams
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn spectator(&self) -> &Spectator {
        &self.spectator
    }

    /// The context holding `player`, asking lobby, game and spectator in
    /// that order.
    pub fn context_of(&self, player: PlayerId) -> ContextKind {
        ContextKind::PRIORITY
            .into_iter()
            .find(|kind| match kind {
                ContextKind::Lobby => self.lobby.contains(player),
                ContextKind::Game => self.game.contains(player),
                ContextKind::Spectator => self.spectator.contains(player),
                ContextKind::None => false,
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.context_of(player) != ContextKind::None
    }

    /// Every player in any context.
    pub fn players(&self) -> Vec<PlayerId> {
        let mut all = self.lobby.players();
        all.extend(self.game.players());
        all.extend(self.spectator.players());
        all
    }

    pub fn can_start(&self) -> bool {
        self.enabled && !self.busy && !self.game.is_running()
    }

    // -- Player movement --------------------------------------------------

    /// Puts a player in the lobby.
    pub fn join(&mut self, players: &mut PlayerRegistry, world: &dyn World, player: PlayerId, reason: JoinReason) -> bool {
        let Parts { mut env, lobby, .. } = self.parts(players, world);
        lobby.add_player(&mut env, player, reason)
    }

    /// Makes a player a spectator: a game player moves over, an outsider
    /// joins directly.
    pub fn spectate(&mut self, players: &mut PlayerRegistry, world: &dyn World, player: PlayerId) -> bool {
        let current = self.context_of(player);
        let Parts { mut env, game, spectator, .. } = self.parts(players, world);
        match current {
            ContextKind::None => spectator.add_player(&mut env, player, JoinReason::Join),
            ContextKind::Game => {
                if !game
                    .remove_player(&mut env, player, LeaveReason::RelationChange)
                    .is_removed()
                {
                    return false;
                }
                let added = spectator.add_player(&mut env, player, JoinReason::RelationChange);
                game.check_game_over(&mut env);
                added
            }
            _ => false,
        }
    }

    /// Removes a player from whichever context holds them.
    pub fn remove(&mut self, players: &mut PlayerRegistry, world: &dyn World, player: PlayerId, reason: LeaveReason) -> Removal {
        let current = self.context_of(player);
        let Parts { mut env, lobby, game, spectator } = self.parts(players, world);
        match current {
            ContextKind::Lobby => lobby.remove_player(&mut env, player, reason),
            ContextKind::Game => game.remove_player(&mut env, player, reason),
            ContextKind::Spectator => spectator.remove_player(&mut env, player, reason),
            ContextKind::None => Removal::NotPresent,
        }
    }

    /// Sets a lobby player's ready flag. Becoming ready may start a game.
    ///
    /// Returns `true` if the flag changed.
    pub fn set_ready(&mut self, players: &mut PlayerRegistry, world: &dyn World, player: PlayerId, ready: bool) -> bool {
        if !self.lobby.contains(player) {
            return false;
        }
        let changed = players.get_mut(player).is_some_and(|p| p.set_ready(ready));
        if !changed {
            return false;
        }
        self.lobby.invalidate();
        self.bus.notify(Notice::Ready {
            arena: self.id,
            player,
            ready,
        });
        if ready {
            self.try_ready_start(players, world);
        }
        true
    }

    /// Starts a game if some lobby group is fully ready and big enough.
    pub fn try_ready_start(&mut self, players: &mut PlayerRegistry, world: &dyn World) -> bool {
        if !self.can_start() {
            return false;
        }
        let group = self.lobby.ready_group(players, &self.settings);
        if group.len() < self.settings.min_players {
            return false;
        }
        self.start_game(players, world, StartReason::PlayersReady)
    }

    /// Advances the lobby's auto-start countdown by one second, starting
    /// the game when it runs out. Returns `true` if a game started.
    pub fn tick_countdown(&mut self, players: &mut PlayerRegistry, world: &dyn World) -> bool {
        let eligible = self.settings.lobby.auto_start
            && self.can_start()
            && self.lobby.len() >= self.settings.start_threshold();
        let Parts { mut env, lobby, game, .. } = self.parts(players, world);
        match lobby.tick_countdown(&env, eligible) {
            Countdown::Elapsed => game.start(&mut env, lobby, StartReason::Auto),
            Countdown::Idle | Countdown::Running(_) => false,
        }
    }

    // -- Game lifecycle ---------------------------------------------------

    pub fn start_game(&mut self, players: &mut PlayerRegistry, world: &dyn World, reason: StartReason) -> bool {
        let Parts { mut env, lobby, game, .. } = self.parts(players, world);
        game.start(&mut env, lobby, reason)
    }

    pub fn end_game(&mut self, players: &mut PlayerRegistry, world: &dyn World) -> bool {
        let Parts { mut env, game, .. } = self.parts(players, world);
        game.end(&mut env)
    }

    pub fn set_winner(&mut self, players: &mut PlayerRegistry, world: &dyn World, winner: Winner) -> bool {
        let Parts { mut env, game, .. } = self.parts(players, world);
        game.set_winner(&mut env, winner)
    }

    pub fn set_loser(&mut self, players: &mut PlayerRegistry, world: &dyn World, team: Team) -> bool {
        let Parts { mut env, game, spectator, .. } = self.parts(players, world);
        game.set_loser(&mut env, spectator, team)
    }

    pub fn eliminate(&mut self, players: &mut PlayerRegistry, world: &dyn World, player: PlayerId) -> bool {
        let Parts { mut env, game, spectator, .. } = self.parts(players, world);
        game.eliminate(&mut env, spectator, player)
    }

    pub fn lose_life(&mut self, players: &mut PlayerRegistry, world: &dyn World, player: PlayerId) -> Option<u32> {
        let Parts { mut env, game, spectator, .. } = self.parts(players, world);
        game.lose_life(&mut env, spectator, player)
    }

    // -- Forwarding -------------------------------------------------------

    /// First half of a move to another arena: leave this arena's game.
    pub(crate) fn forward_out(&mut self, players: &mut PlayerRegistry, world: &dyn World, player: PlayerId) -> Removal {
        let Parts { mut env, game, .. } = self.parts(players, world);
        game.forward_out(&mut env, player)
    }

    /// Second half: join this arena's running game, or its lobby if none
    /// is running.
    pub(crate) fn accept_forwarded(&mut self, players: &mut PlayerRegistry, world: &dyn World, player: PlayerId) -> bool {
        let Parts { mut env, lobby, game, .. } = self.parts(players, world);
        if game.is_running() {
            game.add_player(&mut env, player, JoinReason::Forwarded)
        } else {
            lobby.add_player(&mut env, player, JoinReason::Forwarded)
        }
    }

    // -- Administration ---------------------------------------------------

    /// Registers a spawnpoint. The team set follows the spawnpoints.
    pub fn add_spawn(&mut self, spawn: Spawnpoint) -> bool {
        if !self.spawns.add(&self.bus, spawn) {
            return false;
        }
        self.teams.refresh(self.spawns.teams());
        true
    }

    pub fn remove_spawn(&mut self, name: &str) -> bool {
        if !self.spawns.remove(&self.bus, name) {
            return false;
        }
        self.teams.refresh(self.spawns.teams());
        true
    }

    /// Enables or disables the arena. Disabling ends a running game and
    /// removes every remaining player.
    pub fn set_enabled(&mut self, players: &mut PlayerRegistry, world: &dyn World, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        tracing::info!(arena = %self.id, enabled, "arena toggled");
        if enabled {
            return;
        }

        let Parts { mut env, lobby, game, spectator } = self.parts(players, world);
        lobby.cancel_countdown();
        game.end(&mut env);
        for player in game.players() {
            game.remove_player(&mut env, player, LeaveReason::Disabled);
        }
        for player in lobby.players() {
            lobby.remove_player(&mut env, player, LeaveReason::Disabled);
        }
        for player in spectator.players() {
            spectator.remove_player(&mut env, player, LeaveReason::Disabled);
        }
    }

    /// Tears the arena down for deletion: disables it, deletes its stored
    /// spawnpoints and every player's metadata for it.
    pub(crate) fn purge(&mut self, players: &mut PlayerRegistry, world: &dyn World) {
        self.set_enabled(players, world, false);
        self.spawns.purge();
        self.teams.refresh(std::iter::empty());
        players.clear_arena_metadata(self.id);
    }
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("busy", &self.busy)
            .field("lobby", &self.lobby.len())
            .field("game", &self.game.len())
            .field("spectator", &self.spectator.len())
            .field("running", &self.game.is_running())
            .finish()
    }
}
