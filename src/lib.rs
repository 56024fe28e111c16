//! Festival Sim - entity simulation core for a tent-capture arcade game
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (grid, pathfinding, actors, collisions, capture)
//! - `level`: Level data loading and validation
//! - `tuning`: Data-driven game balance
//! - `error`: Error taxonomy for loading and pathfinding

pub mod error;
pub mod level;
pub mod sim;
pub mod tuning;

pub use error::{PathError, SimError, SimResult};
pub use level::{Level, Placement};
pub use tuning::Tuning;

use glam::Vec2;

/// Engine constants (gameplay values live in [`Tuning`])
pub mod consts {
    /// Display refresh the simulation is paced against
    pub const FRAMES_PER_SECOND: u32 = 60;

    /// Default walkability cell size in world pixels (finer than the visual tile)
    pub const DEFAULT_CELL_SIZE: f32 = 8.0;

    /// Draw/update ordering hints
    pub const Z_GROUND: i32 = 0;
    pub const Z_STRUCTURE: i32 = 1;
    pub const Z_ACTOR: i32 = 2;
    pub const Z_EFFECT: i32 = 3;
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Unit direction from `from` toward `to` (zero when coincident)
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Linear interpolation between two points
#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a.lerp(b, t)
}

/// Step from `from` toward `to` by at most `max_step`, never overshooting.
///
/// Returns the movement delta, not the new position.
#[inline]
pub fn step_toward(from: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let offset = to - from;
    let dist = offset.length();
    if dist <= max_step || dist <= f32::EPSILON {
        offset
    } else {
        offset / dist * max_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_toward_does_not_overshoot() {
        let delta = step_toward(Vec2::ZERO, Vec2::new(3.0, 0.0), 5.0);
        assert!((delta.x - 3.0).abs() < 0.0001);

        let delta = step_toward(Vec2::ZERO, Vec2::new(10.0, 0.0), 2.0);
        assert!((delta.length() - 2.0).abs() < 0.0001);
    }

    #[test]
    fn test_direction_to_coincident_is_zero() {
        assert_eq!(direction_to(Vec2::ONE, Vec2::ONE), Vec2::ZERO);
    }

    #[test]
    fn test_lerp_midpoint() {
        let mid = lerp(Vec2::ZERO, Vec2::new(4.0, 8.0), 0.5);
        assert!((mid - Vec2::new(2.0, 4.0)).length() < 0.0001);
        assert!((distance(Vec2::ZERO, Vec2::new(3.0, 4.0)) - 5.0).abs() < 0.0001);
    }
}
