//! Spawnpoint persistence.
//!
//! The arena configuration format is owned by the host; this crate only
//! needs three operations on it, captured by [`SpawnStore`]. The bundled
//! [`JsonSpawnStore`] keeps the data as a key-value tree:
//!
//! ```text
//! {
//!   "<arena uuid>": {
//!     "<spawn name>": { "kind": "game", "team": "red", "location": {...} }
//!   }
//! }
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use skirmish_types::{ArenaId, Location, SpawnKind, Spawnpoint, Team};

use crate::SpawnError;

/// Storage for an arena's spawnpoints.
///
/// Methods take `&self` so one store can be shared by every arena;
/// implementations provide their own interior mutability.
pub trait SpawnStore: Send + Sync + 'static {
    /// Inserts or replaces a spawnpoint.
    fn save(&self, arena: ArenaId, spawn: &Spawnpoint) -> Result<(), SpawnError>;

    /// Deletes a spawnpoint by name. Deleting a missing name is not an error.
    fn remove(&self, arena: ArenaId, name: &str) -> Result<(), SpawnError>;

    /// Returns every spawnpoint stored for `arena`.
    fn load(&self, arena: ArenaId) -> Result<Vec<Spawnpoint>, SpawnError>;

    /// Deletes everything stored for `arena`.
    fn purge(&self, arena: ArenaId) -> Result<(), SpawnError>;
}

/// The per-spawn record. The name is the key, so it is not repeated.
#[derive(Serialize, Deserialize)]
struct SpawnRecord {
    kind: SpawnKind,
    team: Team,
    location: Location,
}

/// A [`SpawnStore`] holding a JSON key-value tree in memory.
#[derive(Debug, Default)]
pub struct JsonSpawnStore {
    tree: Mutex<Map<String, Value>>,
}

impl JsonSpawnStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a tree previously produced by [`to_json_string`](Self::to_json_string).
    pub fn from_json_str(json: &str) -> Result<Self, SpawnError> {
        let tree: Map<String, Value> = serde_json::from_str(json)?;
        Ok(Self {
            tree: Mutex::new(tree),
        })
    }

    /// Serializes the whole tree, pretty-printed.
    pub fn to_json_string(&self) -> Result<String, SpawnError> {
        Ok(serde_json::to_string_pretty(&*self.tree.lock())?)
    }
}

impl SpawnStore for JsonSpawnStore {
    fn save(&self, arena: ArenaId, spawn: &Spawnpoint) -> Result<(), SpawnError> {
        let record = serde_json::to_value(SpawnRecord {
            kind: spawn.kind.clone(),
            team: spawn.team,
            location: spawn.location.clone(),
        })?;
        let mut tree = self.tree.lock();
        let node = tree
            .entry(arena.0.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match node {
            Value::Object(spawns) => {
                spawns.insert(spawn.name.clone(), record);
                Ok(())
            }
            _ => Err(SpawnError::Store(format!(
                "arena node {arena} is not an object"
            ))),
        }
    }

    fn remove(&self, arena: ArenaId, name: &str) -> Result<(), SpawnError> {
        let mut tree = self.tree.lock();
        if let Some(Value::Object(spawns)) = tree.get_mut(&arena.0.to_string()) {
            spawns.remove(name);
        }
        Ok(())
    }

    fn load(&self, arena: ArenaId) -> Result<Vec<Spawnpoint>, SpawnError> {
        let tree = self.tree.lock();
        let spawns = match tree.get(&arena.0.to_string()) {
            None => return Ok(Vec::new()),
            Some(Value::Object(spawns)) => spawns,
            Some(_) => {
                return Err(SpawnError::Store(format!(
                    "arena node {arena} is not an object"
                )));
            }
        };
        spawns
            .iter()
            .map(|(name, value)| {
                let record: SpawnRecord = serde_json::from_value(value.clone())?;
                Ok(Spawnpoint::new(
                    name.clone(),
                    record.kind,
                    record.team,
                    record.location,
                ))
            })
            .collect()
    }

    fn purge(&self, arena: ArenaId) -> Result<(), SpawnError> {
        self.tree.lock().remove(&arena.0.to_string());
        Ok(())
    }
}
