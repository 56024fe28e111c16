//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod capture;
pub mod character;
pub mod collision;
pub mod entity;
pub mod events;
pub mod grid;
pub mod pathfind;
pub mod pickup;
pub mod tick;
pub mod world;

pub use capture::{CaptureOutcome, TentGroup, TentSnapshot};
pub use character::CharacterState;
pub use collision::{Contact, detect_and_resolve};
pub use entity::{Actor, BoundingBox, Entity, EntityId, EntityKind, Facing, ObstacleKind, SpawnKind, Tent};
pub use events::{EventSink, GameEvent, SoundCue};
pub use grid::{Tile, WalkGrid, Walkability};
pub use pathfind::{Path, PathRequest, Pathfinder};
pub use pickup::PickupState;
pub use tick::{TickInput, tick};
pub use world::{View, World};
