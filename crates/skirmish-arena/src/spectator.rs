//! Spectators: membership plus a spectator spawn, nothing else.

use skirmish_types::{ContextKind, JoinReason, LeaveReason, PlayerId, SpawnKind};

use crate::context::{self, Entry, Env};
use crate::{ArenaSettings, ContextManager, Membership, Removal, SpectatorSettings};

#[derive(Debug, Default)]
pub struct Spectator {
    members: Membership,
}

impl Spectator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ContextManager for Spectator {
    type Settings = SpectatorSettings;

    fn kind(&self) -> ContextKind {
        ContextKind::Spectator
    }

    fn membership(&self) -> &Membership {
        &self.members
    }

    fn settings<'s>(&self, arena: &'s ArenaSettings) -> &'s SpectatorSettings {
        &arena.spectator
    }

    fn add_player(&mut self, env: &mut Env<'_>, player: PlayerId, reason: JoinReason) -> bool {
        let entry = Entry {
            kind: ContextKind::Spectator,
            spawn: SpawnKind::Spectator,
            reserve: env.settings.spectator.reserve_spawns,
        };
        context::add_player(&mut self.members, env, player, reason, entry, |p, _| {
            p.invulnerable = true;
        })
    }

    fn remove_player(&mut self, env: &mut Env<'_>, player: PlayerId, reason: LeaveReason) -> Removal {
        context::remove_player(
            &mut self.members,
            env,
            player,
            reason,
            ContextKind::Spectator,
            |_, _| {},
            |env, player| {
                if let Some(p) = env.players.get_mut(player) {
                    p.invulnerable = false;
                }
                env.settings.remove_location.clone()
            },
        )
    }
}
