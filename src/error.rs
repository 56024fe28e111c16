//! Error taxonomy
//!
//! Loading is strict (malformed level data is returned to the caller), live
//! play is resilient (pathfinding failures are values, invariant violations
//! are logged and the frame continues).

use thiserror::Error;

use crate::sim::grid::Tile;

/// Errors raised while loading level data or spawning entities
#[derive(Debug, Error)]
pub enum SimError {
    /// Placement names a type the simulation cannot spawn
    #[error("unknown spawn type: {0:?}")]
    UnknownSpawnType(String),
    /// Walkability grid has no rows or no columns
    #[error("walkability grid is empty")]
    EmptyGrid,
    /// Walkability rows of differing length
    #[error("walkability row {row} has {found} tiles, expected {expected}")]
    RaggedGrid {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// Walkability value outside 0..=2
    #[error("invalid walkability value {0}")]
    InvalidWalkability(u8),
    #[error("malformed level data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read level data: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;

/// Non-fatal pathfinding failures; the requesting actor retries later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    /// No walkable tile within the search radius of an endpoint
    #[error("no walkable tile near {tile:?}")]
    NoWalkableTile { tile: Tile },
    /// Both endpoints walkable but disconnected
    #[error("no route from {from:?} to {to:?}")]
    NoRoute { from: Tile, to: Tile },
}
