//! Error types for the spawn layer.

/// Errors raised by spawnpoint persistence.
///
/// Allocation itself never fails with an error: a missing spawnpoint is an
/// `Option::None`, a vetoed mutation is a `false`.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// The backing store rejected the operation.
    #[error("spawn store failure: {0}")]
    Store(String),

    /// Stored spawn data could not be parsed.
    #[error("malformed spawn data: {0}")]
    Malformed(#[from] serde_json::Error),
}
