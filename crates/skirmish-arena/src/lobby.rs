//! The lobby: where players wait for a game.
//!
//! Joining the lobby assigns a team. The lobby decides *who* plays next
//! (ready and next groups) and keeps the auto-start countdown; the
//! [`Game`](crate::Game) decides *whether* it can start.

use skirmish_session::PlayerRegistry;
use skirmish_types::{
    ContextKind, JoinReason, LeaveReason, Notice, PlayerId, SpawnKind, Team,
};

use crate::context::{self, Entry, Env};
use crate::{ArenaSettings, ContextManager, LobbySettings, Membership, Removal};

/// What one countdown step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    /// Not counting.
    Idle,
    /// Counting; this many seconds remain.
    Running(u32),
    /// Reached zero: start the game now.
    Elapsed,
}

#[derive(Debug, Default)]
pub struct Lobby {
    members: Membership,
    countdown: Option<u32>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first group whose members are all ready, if it is big enough to
    /// start a game.
    pub fn ready_group(&mut self, players: &PlayerRegistry, settings: &ArenaSettings) -> Vec<PlayerId> {
        self.members.ready_group(players, settings.start_threshold())
    }

    /// The group an automatic start would pull.
    pub fn next_group(&mut self, players: &PlayerRegistry, settings: &ArenaSettings) -> Vec<PlayerId> {
        self.members.next_group(players, settings.start_threshold())
    }

    /// Forgets cached group results after a ready flag changed.
    pub fn invalidate(&mut self) {
        self.members.invalidate();
    }

    /// Seconds left on the auto-start countdown, if one is running.
    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    /// Advances the countdown by one second.
    ///
    /// `eligible` says whether auto-start conditions hold right now. If
    /// they stop holding mid-countdown, the countdown is cancelled and
    /// restarts from the top next time.
    pub(crate) fn tick_countdown(&mut self, env: &Env<'_>, eligible: bool) -> Countdown {
        if !eligible {
            if self.countdown.take().is_some() {
                tracing::debug!(arena = %env.arena, "countdown cancelled");
                env.bus.notify(Notice::CountdownCancelled { arena: env.arena });
            }
            return Countdown::Idle;
        }

        let remaining = match self.countdown {
            None => env.settings.lobby.countdown_secs,
            Some(n) => n.saturating_sub(1),
        };
        if remaining == 0 {
            self.countdown = None;
            return Countdown::Elapsed;
        }
        self.countdown = Some(remaining);
        env.bus.notify(Notice::CountdownTick {
            arena: env.arena,
            remaining,
        });
        Countdown::Running(remaining)
    }

    pub(crate) fn cancel_countdown(&mut self) {
        self.countdown = None;
    }
}

impl ContextManager for Lobby {
    type Settings = LobbySettings;

    fn kind(&self) -> ContextKind {
        ContextKind::Lobby
    }

    fn membership(&self) -> &Membership {
        &self.members
    }

    fn settings<'s>(&self, arena: &'s ArenaSettings) -> &'s LobbySettings {
        &arena.lobby
    }

    fn add_player(&mut self, env: &mut Env<'_>, player: PlayerId, reason: JoinReason) -> bool {
        let invulnerable = env.settings.lobby.invulnerable;
        let entry = Entry {
            kind: ContextKind::Lobby,
            spawn: SpawnKind::Lobby,
            reserve: env.settings.lobby.reserve_spawns,
        };
        context::add_player(&mut self.members, env, player, reason, entry, |p, teams| {
            if p.team() == Team::None {
                if let Some(team) = teams.next() {
                    p.set_team(team);
                }
            }
            p.invulnerable = invulnerable;
        })
    }

    fn remove_player(&mut self, env: &mut Env<'_>, player: PlayerId, reason: LeaveReason) -> Removal {
        context::remove_player(
            &mut self.members,
            env,
            player,
            reason,
            ContextKind::Lobby,
            |_, _| {},
            |env, player| {
                if let Some(p) = env.players.get_mut(player) {
                    p.invulnerable = false;
                    p.set_ready(false);
                }
                env.settings.remove_location.clone()
            },
        )
    }
}
