//! World-facing value types: locations, teams and spawnpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A position in the host world. Opaque to this crate apart from equality:
/// only the host knows how to teleport an entity there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl Location {
    /// Creates a location facing the default direction.
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@({:.1}, {:.1}, {:.1})", self.world, self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A team label.
///
/// `None` is the label of a player without a team. `Any` is only meaningful
/// on spawnpoints: such a point accepts players of every team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    #[default]
    None,
    Any,
    Red,
    Blue,
    Green,
    Yellow,
    Aqua,
    Purple,
    White,
    Black,
}

impl Team {
    /// Returns `true` for labels a player can actually be assigned.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, Self::None | Self::Any)
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Any => "any",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Aqua => "aqua",
            Self::Purple => "purple",
            Self::White => "white",
            Self::Black => "black",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Spawnpoint
// ---------------------------------------------------------------------------

/// The type tag of a spawnpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnKind {
    Lobby,
    Game,
    Spectator,
    /// Game-type specific points (flags, bases, item drops).
    Custom(String),
}

impl fmt::Display for SpawnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => f.write_str("lobby"),
            Self::Game => f.write_str("game"),
            Self::Spectator => f.write_str("spectator"),
            Self::Custom(tag) => write!(f, "custom:{tag}"),
        }
    }
}

/// A named, typed, team-tagged candidate teleport location.
///
/// Names are unique within an arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawnpoint {
    pub name: String,
    pub kind: SpawnKind,
    pub team: Team,
    pub location: Location,
}

impl Spawnpoint {
    pub fn new(
        name: impl Into<String>,
        kind: SpawnKind,
        team: Team,
        location: Location,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            team,
            location,
        }
    }

    /// Returns `true` if a player of `team` may use this point.
    ///
    /// Points tagged `Any` (or left untagged) accept every team.
    pub fn accepts(&self, team: Team) -> bool {
        matches!(self.team, Team::Any | Team::None) || self.team == team
    }

    /// Returns `true` if this point has the given kind and accepts `team`.
    pub fn matches(&self, kind: &SpawnKind, team: Team) -> bool {
        &self.kind == kind && self.accepts(team)
    }
}
