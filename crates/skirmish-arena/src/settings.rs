//! Per-arena configuration.
//!
//! Plain data: the host loads it from its own configuration files and
//! hands it to [`ArenaManager::create_arena`](crate::ArenaManager::create_arena).
//! Every struct deserializes with defaults for missing fields.

use serde::{Deserialize, Serialize};
use skirmish_types::Location;

// ---------------------------------------------------------------------------
// ArenaSettings
// ---------------------------------------------------------------------------

/// Configuration for one arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    /// Minimum players required to start a game.
    pub min_players: usize,

    /// Maximum size of a queueing group.
    pub max_players: usize,

    /// Where players are sent when they leave the arena. `None` leaves
    /// them where they are.
    pub remove_location: Option<Location>,

    pub lobby: LobbySettings,
    pub game: GameSettings,
    pub spectator: SpectatorSettings,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 8,
            remove_location: None,
            lobby: LobbySettings::default(),
            game: GameSettings::default(),
            spectator: SpectatorSettings::default(),
        }
    }
}

impl ArenaSettings {
    /// Parses settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::validated)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Fixes values that would make the arena unusable.
    ///
    /// - `min_players` is at least 1
    /// - `max_players` is at least `min_players`
    /// - `game.lives` is at least 1
    pub fn validated(mut self) -> Self {
        if self.min_players == 0 {
            tracing::warn!("min_players is 0, using 1");
            self.min_players = 1;
        }
        if self.max_players < self.min_players {
            tracing::warn!(
                min = self.min_players,
                max = self.max_players,
                "max_players below min_players, raising it"
            );
            self.max_players = self.min_players;
        }
        if self.game.lives == 0 {
            tracing::warn!("game.lives is 0, using 1");
            self.game.lives = 1;
        }
        self
    }

    /// The lobby size at which a game may start: the larger of the arena
    /// minimum and the lobby's own auto-start threshold.
    pub fn start_threshold(&self) -> usize {
        self.min_players.max(self.lobby.min_auto_start_players)
    }
}

// ---------------------------------------------------------------------------
// Context settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbySettings {
    /// Start a countdown once enough players are waiting.
    pub auto_start: bool,

    /// Extra floor on top of `min_players` for automatic starts.
    pub min_auto_start_players: usize,

    /// Length of the auto-start countdown.
    pub countdown_secs: u32,

    /// Waiting players take no damage.
    pub invulnerable: bool,

    pub reserve_spawns: bool,
}

impl Default for LobbySettings {
    fn default() -> Self {
        Self {
            auto_start: true,
            min_auto_start_players: 0,
            countdown_secs: 10,
            invulnerable: true,
            reserve_spawns: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Lives each player starts a game with.
    pub lives: u32,

    /// Give every player their own spawnpoint for the whole game.
    pub reserve_spawns: bool,

    /// Eliminated players watch the rest of the game instead of leaving.
    pub spectate_on_lose: bool,

    pub game_over: GameOverPolicy,

    /// Points awarded to each winner.
    pub win_points: i64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            lives: 1,
            reserve_spawns: true,
            spectate_on_lose: false,
            game_over: GameOverPolicy::default(),
            win_points: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectatorSettings {
    pub reserve_spawns: bool,
}

/// When a running game ends on its own after players drop out.
///
/// ```text
/// WhenEmpty           no players left           → end, no winner
/// LastPlayerStanding  one player left           → that player wins
/// LastTeamStanding    one team left             → that team wins
/// ```
///
/// Every policy also ends an empty game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverPolicy {
    #[default]
    WhenEmpty,
    LastPlayerStanding,
    LastTeamStanding,
}
