//! Data-driven game balance
//!
//! Every duration is in frames, every distance in world pixels.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimResult;

/// Gameplay tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Movement ===
    /// Player speed (pixels per frame)
    pub player_speed: f32,
    /// Festival-goer base speed (pixels per frame)
    pub goer_speed: f32,
    /// Random +/- spread applied to each arriving goer's speed
    pub goer_speed_jitter: f32,
    /// Flee speed (pixels per frame)
    pub flee_speed: f32,
    /// Centroid-to-waypoint distance that counts as reached
    pub waypoint_epsilon: f32,

    // === Character states ===
    pub flee_duration: u64,
    pub smash_duration: u64,
    pub tent_piss_duration: u64,
    pub big_piss_duration: u64,
    /// Frames a goer waits before re-scanning after a failed acquisition
    pub acquire_retry: u64,

    // === Tents ===
    pub max_damage: u32,
    pub max_pissiness: u32,
    /// Minimum frames between effect-area pissiness increments
    pub piss_cooldown: u64,
    /// Frames between pissiness decrements while dry
    pub heal_cooldown: u64,
    /// Hit flash after a smash/piss lands
    pub hit_flash_frames: u32,
    /// Reach beyond the player's bbox that counts as touching a tent
    pub touch_reach: f32,

    // === Capture ===
    /// Centroid distance within which tents are adjacent
    pub adjacency_radius: f32,
    /// Groups larger than this are never claimable
    pub max_capture_group: usize,
    /// Score per newly captured tent
    pub capture_bonus: u64,

    // === Resources ===
    pub beer_capacity: f32,
    pub beer_per_crate: f32,
    /// Beer consumed per frame of free-aim pissing
    pub piss_drain: f32,
    pub tent_piss_cost: f32,
    pub big_piss_cost: f32,
    /// Frames until a picked-up crate respawns
    pub respawn_time: u64,

    // === Effect areas ===
    /// Max distance from the player to the free-aim stream's end
    pub piss_reach: f32,
    pub piss_area_half: f32,
    pub big_piss_area_half: f32,

    // === Pathfinding ===
    /// Nearest-walkable search radius in tiles; 0 derives it from footprints
    pub walkable_search_radius: i32,

    // === Arrivals ===
    pub arrival_interval: u64,
    pub max_goers: usize,

    // === View ===
    pub view_width: f32,
    pub view_height: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_speed: 2.0,
            goer_speed: 1.2,
            goer_speed_jitter: 0.3,
            flee_speed: 2.5,
            waypoint_epsilon: 2.0,

            flee_duration: 90,
            smash_duration: 30,
            tent_piss_duration: 45,
            big_piss_duration: 120,
            acquire_retry: 60,

            max_damage: 3,
            max_pissiness: 5,
            piss_cooldown: 20,
            heal_cooldown: 240,
            hit_flash_frames: 12,
            touch_reach: 4.0,

            adjacency_radius: 64.0,
            max_capture_group: 5,
            capture_bonus: 100,

            beer_capacity: 100.0,
            beer_per_crate: 40.0,
            piss_drain: 0.5,
            tent_piss_cost: 10.0,
            big_piss_cost: 80.0,
            respawn_time: 600,

            piss_reach: 48.0,
            piss_area_half: 6.0,
            big_piss_area_half: 40.0,

            walkable_search_radius: 0,

            arrival_interval: 180,
            max_goers: 12,

            view_width: 480.0,
            view_height: 270.0,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning overrides");
        Ok(tuning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json_str(r#"{ "max_capture_group": 3 }"#).unwrap();
        assert_eq!(tuning.max_capture_group, 3);
        assert_eq!(tuning.max_damage, Tuning::default().max_damage);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(Tuning::from_json_str("{ not json").is_err());
    }
}
