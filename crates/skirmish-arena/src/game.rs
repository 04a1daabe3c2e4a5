//! The game: start/end state machine, winners and losers.
//!
//! ```text
//!            start(reason)                    end() / set_winner()
//!   idle ───────────────────→ running ─────────────────────────────→ idle
//!          pulls a lobby group     │  terminal removals run the
//!                                  │  game-over policy
//!                                  ▼
//!                              game over ──→ end()
//! ```

use std::time::Instant;

use skirmish_types::{
    ContextKind, JoinReason, LeaveReason, Notice, PlayerId, SpawnKind,
    StartReason, StartRequest, Team,
};

use crate::context::{self, Entry, Env};
use crate::{
    ArenaSettings, ContextManager, GameOverPolicy, GameSettings, Lobby,
    Membership, Removal, Spectator,
};

/// Who won a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Player(PlayerId),
    Team(Team),
}

#[derive(Debug, Default)]
pub struct Game {
    members: Membership,
    running: bool,
    game_over: bool,
    started_at: Option<Instant>,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a winner has been decided. Only meaningful while running.
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// A game can start when the arena is enabled, not busy, and no game
    /// is running.
    pub fn can_start(&self, env: &Env<'_>) -> bool {
        env.enabled && !*env.busy && !self.running
    }

    /// Starts a game with players pulled from the lobby.
    ///
    /// Automatic starts take the lobby's next group, every other reason
    /// its ready group. Listeners may trim or cancel the candidate set.
    /// Returns `false` if the game cannot start, there is nobody to start
    /// with, or the start was cancelled.
    pub fn start(&mut self, env: &mut Env<'_>, lobby: &mut Lobby, reason: StartReason) -> bool {
        let arena = env.arena;
        if !self.can_start(env) {
            tracing::debug!(%arena, enabled = env.enabled, busy = *env.busy, running = self.running, "game cannot start");
            return false;
        }

        let candidates = match reason {
            StartReason::Auto => lobby.next_group(env.players, env.settings),
            _ => lobby.ready_group(env.players, env.settings),
        };
        if candidates.is_empty() {
            tracing::debug!(%arena, ?reason, "no group to start with");
            return false;
        }

        let request = env.bus.review_start(StartRequest {
            arena,
            reason,
            candidates,
            cancelled: false,
        });
        if request.cancelled || request.candidates.is_empty() {
            return false;
        }

        *env.busy = true;
        lobby.cancel_countdown();
        let mut started = Vec::with_capacity(request.candidates.len());
        for player in request.candidates {
            if !lobby.contains(player) {
                tracing::debug!(%arena, %player, "candidate no longer in lobby, skipped");
                continue;
            }
            lobby.remove_player(env, player, LeaveReason::RelationChange);
            if self.add_player(env, player, JoinReason::RelationChange) {
                started.push(player);
            }
        }
        *env.busy = false;

        if started.is_empty() {
            return false;
        }

        self.running = true;
        self.game_over = false;
        self.started_at = Some(Instant::now());
        tracing::info!(%arena, ?reason, players = started.len(), "game started");
        env.bus.notify(Notice::GameStarted {
            arena,
            reason,
            players: started,
        });
        true
    }

    /// Ends the running game. Spawn reservations are released and every
    /// remaining player leaves the arena.
    ///
    /// Returns `false` if no game is running.
    pub fn end(&mut self, env: &mut Env<'_>) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        self.game_over = false;
        let duration = self.started_at.take().map(|t| t.elapsed());

        if !env.spawns.clear_reserved(env.bus) {
            tracing::warn!(arena = %env.arena, "clearing reservations vetoed");
        }
        tracing::info!(arena = %env.arena, ?duration, "game ended");
        env.bus.notify(Notice::GameEnded { arena: env.arena });

        for player in self.players() {
            self.remove_player(env, player, LeaveReason::GameEnded);
        }
        true
    }

    /// Declares the winner and ends the game.
    ///
    /// Winners are awarded the configured points. Every other player in the
    /// game is declared a loser. A team win is announced after the
    /// per-player results.
    pub fn set_winner(&mut self, env: &mut Env<'_>, winner: Winner) -> bool {
        if !self.running {
            return false;
        }
        self.game_over = true;
        let arena = env.arena;
        let points = env.settings.game.win_points;

        for player in self.players() {
            let won = match winner {
                Winner::Player(w) => w == player,
                Winner::Team(team) => env.players.get(player).is_some_and(|p| p.team() == team),
            };
            if won {
                if let Some(p) = env.players.get_mut(player) {
                    p.award(points);
                }
                env.bus.notify(Notice::PlayerWon { arena, player });
            } else {
                env.bus.notify(Notice::PlayerLost { arena, player });
            }
        }
        if let Winner::Team(team) = winner {
            env.bus.notify(Notice::TeamWon { arena, team });
        }
        tracing::info!(%arena, ?winner, "winner declared");

        self.end(env)
    }

    /// Eliminates every player of `team` without declaring a winner.
    pub fn set_loser(&mut self, env: &mut Env<'_>, spectator: &mut Spectator, team: Team) -> bool {
        if !self.running {
            return false;
        }
        let losers: Vec<_> = self
            .players()
            .into_iter()
            .filter(|p| env.players.get(*p).is_some_and(|r| r.team() == team))
            .collect();
        for player in losers {
            self.eliminate(env, spectator, player);
        }
        env.bus.notify(Notice::TeamLost {
            arena: env.arena,
            team,
        });
        tracing::info!(arena = %env.arena, %team, "team lost");
        true
    }

    /// Takes a player out of the game as a loser: to the spectators if the
    /// arena is configured for it, out of the arena otherwise.
    pub fn eliminate(&mut self, env: &mut Env<'_>, spectator: &mut Spectator, player: PlayerId) -> bool {
        if !self.contains(player) {
            return false;
        }
        env.bus.notify(Notice::PlayerLost {
            arena: env.arena,
            player,
        });
        if !env.settings.game.spectate_on_lose {
            return self.remove_player(env, player, LeaveReason::Lose).is_removed();
        }
        if !self
            .remove_player(env, player, LeaveReason::RelationChange)
            .is_removed()
        {
            return false;
        }
        if !spectator.add_player(env, player, JoinReason::RelationChange) {
            tracing::warn!(arena = %env.arena, %player, "eliminated player could not spectate");
        }
        self.check_game_over(env);
        true
    }

    /// Takes one life. At zero the player is eliminated. Returns the lives
    /// left, or `None` if the player is not in the game.
    pub fn lose_life(&mut self, env: &mut Env<'_>, spectator: &mut Spectator, player: PlayerId) -> Option<u32> {
        if !self.contains(player) {
            return None;
        }
        let record = env.players.get_mut(player)?;
        record.lives = record.lives.saturating_sub(1);
        let lives = record.lives;
        if lives == 0 {
            self.eliminate(env, spectator, player);
        }
        Some(lives)
    }

    /// Applies the game-over policy to the players still in the game.
    pub(crate) fn check_game_over(&mut self, env: &mut Env<'_>) {
        if !self.running {
            return;
        }
        let remaining = self.players();
        if remaining.is_empty() {
            self.end(env);
            return;
        }
        let winner = match env.settings.game.game_over {
            GameOverPolicy::WhenEmpty => None,
            GameOverPolicy::LastPlayerStanding => match remaining.as_slice() {
                [last] => Some(Winner::Player(*last)),
                _ => None,
            },
            GameOverPolicy::LastTeamStanding => {
                let mut teams: Vec<Team> = remaining
                    .iter()
                    .filter_map(|p| env.players.get(*p).map(|r| r.team()))
                    .collect();
                teams.sort();
                teams.dedup();
                match (teams.as_slice(), remaining.as_slice()) {
                    ([Team::None], [last]) => Some(Winner::Player(*last)),
                    ([Team::None], _) => None,
                    ([team], _) => Some(Winner::Team(*team)),
                    _ => None,
                }
            }
        };
        if let Some(winner) = winner {
            tracing::debug!(arena = %env.arena, ?winner, "game over");
            self.set_winner(env, winner);
        }
    }

    /// Removes a player for a move to another arena. A forwarded player has
    /// not lost, so no winner is declared, but a game left empty ends.
    pub(crate) fn forward_out(&mut self, env: &mut Env<'_>, player: PlayerId) -> Removal {
        let removal = self.remove_player(env, player, LeaveReason::Forwarding);
        if removal.is_removed() && self.running && self.is_empty() {
            tracing::debug!(arena = %env.arena, "last player forwarded away");
            self.end(env);
        }
        removal
    }
}

impl ContextManager for Game {
    type Settings = GameSettings;

    fn kind(&self) -> ContextKind {
        ContextKind::Game
    }

    fn membership(&self) -> &Membership {
        &self.members
    }

    fn settings<'s>(&self, arena: &'s ArenaSettings) -> &'s GameSettings {
        &arena.game
    }

    fn add_player(&mut self, env: &mut Env<'_>, player: PlayerId, reason: JoinReason) -> bool {
        let lives = env.settings.game.lives;
        let entry = Entry {
            kind: ContextKind::Game,
            spawn: SpawnKind::Game,
            reserve: env.settings.game.reserve_spawns,
        };
        context::add_player(&mut self.members, env, player, reason, entry, |p, teams| {
            if p.team() == Team::None {
                if let Some(team) = teams.next() {
                    p.set_team(team);
                }
            }
            p.set_ready(false);
            p.invulnerable = false;
            p.lives = lives;
            p.points = 0;
        })
    }

    fn remove_player(&mut self, env: &mut Env<'_>, player: PlayerId, reason: LeaveReason) -> Removal {
        let removal = context::remove_player(
            &mut self.members,
            env,
            player,
            reason,
            ContextKind::Game,
            |_, _| {},
            |env, player| {
                if let Some(p) = env.players.get_mut(player) {
                    p.immobilized = false;
                }
                env.settings.remove_location.clone()
            },
        );
        if removal.is_removed() && reason.is_terminal() {
            self.check_game_over(env);
        }
        removal
    }
}
