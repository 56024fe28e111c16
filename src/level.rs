//! Level data
//!
//! A level is a walkability grid plus a list of typed placements. Loading is
//! strict: a malformed grid or an unknown placement type fails the whole load
//! before any entity is spawned.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_CELL_SIZE;
use crate::error::SimResult;
use crate::sim::entity::SpawnKind;
use crate::sim::grid::{WalkGrid, Walkability};
use crate::sim::world::World;
use crate::tuning::Tuning;

fn default_cell_size() -> f32 {
    DEFAULT_CELL_SIZE
}

fn default_enabled() -> bool {
    true
}

/// One object placed in the level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Spawn type name, e.g. "tent" or "festival_goer"
    #[serde(rename = "type")]
    pub kind: String,
    /// Top-left of the entity in world pixels
    pub position: Vec2,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Placement {
    pub fn new(kind: &str, x: f32, y: f32) -> Self {
        Self {
            kind: kind.to_string(),
            position: Vec2::new(x, y),
            enabled: true,
        }
    }
}

/// Serialized level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Row-major walkability codes (0 walkable, 1 AI-blocked, 2 blocked)
    pub walkability: Vec<Vec<Walkability>>,
    pub placements: Vec<Placement>,
    /// Where arriving festival-goers appear
    #[serde(default)]
    pub arrival_points: Vec<Vec2>,
    /// RNG seed for arrivals
    #[serde(default)]
    pub seed: u64,
}

impl Level {
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let level = Self::from_json_str(&json)?;
        log::info!(
            "Loaded level {} ({} placements)",
            path.display(),
            level.placements.len()
        );
        Ok(level)
    }

    /// Build a ready-to-tick world
    pub fn build_world(&self, tuning: Tuning) -> SimResult<World> {
        let grid = WalkGrid::from_rows(&self.walkability, self.cell_size)?;

        // Reject the whole level before spawning anything
        for placement in &self.placements {
            placement.kind.parse::<SpawnKind>()?;
        }

        let mut world = World::new(grid, tuning, self.seed);
        world.set_arrival_points(self.arrival_points.clone());
        for placement in &self.placements {
            world.spawn_placement(placement)?;
        }
        world.rebuild_tent_adjacency();
        world.recompute_groups();
        // Initial coloring is not a capture
        world.score = 0;
        world.drain_events();

        log::info!(
            "World built: {}x{} cells, {} entities",
            world.grid().cols(),
            world.grid().rows(),
            world.entity_count()
        );
        Ok(world)
    }

    /// Built-in festival field used when no level file is given
    pub fn demo() -> Self {
        const COLS: usize = 60;
        const ROWS: usize = 40;

        let mut walkability = vec![vec![Walkability::Walkable; COLS]; ROWS];
        // Pond: nobody crosses
        for row in &mut walkability[18..23] {
            row[8..13].fill(Walkability::Unwalkable);
        }
        // Hedge: goers route around, the player pushes through
        for row in &mut walkability[5..16] {
            row[45] = Walkability::AiUnwalkable;
        }

        let mut placements = vec![
            Placement::new("player", 240.0, 150.0),
            Placement::new("stage", 180.0, 10.0),
            Placement::new("toilet", 420.0, 200.0),
            Placement::new("fence", 300.0, 140.0),
            Placement::new("fence", 332.0, 140.0),
            Placement::new("beer_crate", 200.0, 200.0),
            Placement::new("beer_crate", 420.0, 40.0),
        ];
        // Small claimable cluster
        for i in 0..3 {
            placements.push(Placement::new("tent", 40.0 + 36.0 * i as f32, 40.0));
        }
        // Pair by the stage
        for i in 0..2 {
            placements.push(Placement::new("tent", 320.0 + 36.0 * i as f32, 60.0));
        }
        // Camping row too large to claim until broken up
        for i in 0..6 {
            placements.push(Placement::new("tent", 40.0 + 36.0 * i as f32, 260.0));
        }

        Self {
            cell_size: DEFAULT_CELL_SIZE,
            walkability,
            placements,
            arrival_points: vec![Vec2::new(16.0, 160.0), Vec2::new(460.0, 290.0)],
            seed: 0xF357_1A1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::sim::capture::TentGroup;

    const SMALL: &str = r#"{
        "walkability": [[0, 0, 0, 0], [0, 1, 2, 0], [0, 0, 0, 0]],
        "placements": [
            {"type": "player", "position": [0.0, 0.0]},
            {"type": "tent", "position": [8.0, 0.0], "enabled": false}
        ]
    }"#;

    #[test]
    fn test_parse_level() {
        let level = Level::from_json_str(SMALL).unwrap();
        assert_eq!(level.cell_size, DEFAULT_CELL_SIZE);
        assert_eq!(level.walkability[1][2], Walkability::Unwalkable);
        assert_eq!(level.placements[0].kind, "player");
        assert!(level.placements[0].enabled);
        assert!(!level.placements[1].enabled);
        assert!(level.arrival_points.is_empty());
    }

    #[test]
    fn test_unknown_type_fails_whole_load() {
        let mut level = Level::from_json_str(SMALL).unwrap();
        level.placements.push(Placement::new("ferris_wheel", 0.0, 0.0));
        let err = level.build_world(Tuning::default()).unwrap_err();
        assert!(matches!(err, SimError::UnknownSpawnType(ref t) if t == "ferris_wheel"));
    }

    #[test]
    fn test_invalid_walkability_rejected() {
        let json = r#"{"walkability": [[0, 7]], "placements": []}"#;
        assert!(matches!(Level::from_json_str(json), Err(SimError::Json(_))));
    }

    #[test]
    fn test_ragged_grid_rejected() {
        let json = r#"{"walkability": [[0, 0], [0]], "placements": []}"#;
        let level = Level::from_json_str(json).unwrap();
        assert!(matches!(
            level.build_world(Tuning::default()),
            Err(SimError::RaggedGrid { .. })
        ));
    }

    #[test]
    fn test_demo_world_groups() {
        let world = Level::demo().build_world(Tuning::default()).unwrap();
        assert!(world.player_id().is_some());
        assert_eq!(world.score, 0);

        let tents = world.tent_ids();
        assert_eq!(tents.len(), 11);
        let blue = tents
            .iter()
            .filter(|id| world.groups().get(id) == Some(&TentGroup::Blue))
            .count();
        // Cluster of three plus the pair; the row of six stays uncolored
        assert_eq!(blue, 5);
    }

    #[test]
    fn test_level_json_roundtrip_preserves_placements() {
        let level = Level::demo();
        let json = serde_json::to_string(&level).unwrap();
        let back = Level::from_json_str(&json).unwrap();
        assert_eq!(back, level);
    }
}
