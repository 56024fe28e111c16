//! Walkability grid
//!
//! World positions map onto a fixed-size grid of tri-state tiles. The grid
//! owns the pathfinder and re-synchronises its copy after every edit.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::pathfind::Pathfinder;
use crate::error::{PathError, SimError};

/// Tri-state walkability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Walkability {
    #[default]
    Walkable,
    /// Blocks autonomous pathing; the player may still cross it
    AiUnwalkable,
    /// Blocks everyone
    Unwalkable,
}

impl Walkability {
    /// Whether autonomous actors may path through this tile
    #[inline]
    pub fn ai_can_walk(self) -> bool {
        self == Walkability::Walkable
    }

    /// Whether the player may stand on this tile
    #[inline]
    pub fn player_can_walk(self) -> bool {
        self != Walkability::Unwalkable
    }

    /// Editor cycle: Walkable -> AiUnwalkable -> Unwalkable -> Walkable
    pub fn next(self) -> Self {
        match self {
            Walkability::Walkable => Walkability::AiUnwalkable,
            Walkability::AiUnwalkable => Walkability::Unwalkable,
            Walkability::Unwalkable => Walkability::Walkable,
        }
    }
}

impl TryFrom<u8> for Walkability {
    type Error = SimError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Walkability::Walkable),
            1 => Ok(Walkability::AiUnwalkable),
            2 => Ok(Walkability::Unwalkable),
            other => Err(SimError::InvalidWalkability(other)),
        }
    }
}

impl From<Walkability> for u8 {
    fn from(value: Walkability) -> Self {
        match value {
            Walkability::Walkable => 0,
            Walkability::AiUnwalkable => 1,
            Walkability::Unwalkable => 2,
        }
    }
}

/// Grid coordinate (signed so off-grid positions stay representable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    pub col: i32,
    pub row: i32,
}

impl Tile {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }
}

/// Walkability grid plus the pathfinder that searches it
#[derive(Debug, Clone)]
pub struct WalkGrid {
    cols: usize,
    rows: usize,
    cell_size: f32,
    tiles: Vec<Walkability>,
    pathfinder: Pathfinder,
}

impl WalkGrid {
    /// Build from row-major tile rows. Rows must be non-empty and equal length.
    pub fn from_rows(rows: &[Vec<Walkability>], cell_size: f32) -> Result<Self, SimError> {
        let expected = rows.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(SimError::EmptyGrid);
        }
        for (row, tiles) in rows.iter().enumerate() {
            if tiles.len() != expected {
                return Err(SimError::RaggedGrid {
                    row,
                    expected,
                    found: tiles.len(),
                });
            }
        }
        let tiles: Vec<Walkability> = rows.iter().flatten().copied().collect();
        Ok(Self::with_tiles(expected, rows.len(), cell_size, tiles))
    }

    /// Fully walkable grid
    pub fn open(cols: usize, rows: usize, cell_size: f32) -> Self {
        Self::with_tiles(
            cols.max(1),
            rows.max(1),
            cell_size,
            vec![Walkability::Walkable; cols.max(1) * rows.max(1)],
        )
    }

    fn with_tiles(cols: usize, rows: usize, cell_size: f32, tiles: Vec<Walkability>) -> Self {
        let mut grid = Self {
            cols,
            rows,
            cell_size,
            tiles,
            pathfinder: Pathfinder::new(cols, rows),
        };
        grid.sync_pathfinder();
        grid
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World-space size of the grid in pixels
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.cols as f32, self.rows as f32) * self.cell_size
    }

    pub fn pathfinder(&self) -> &Pathfinder {
        &self.pathfinder
    }

    /// Map a world position to a tile without clamping
    pub fn to_grid_coords_unclamped(&self, pos: Vec2) -> Tile {
        if !pos.is_finite() {
            log::error!("non-finite world position {pos:?} mapped to grid");
        }
        Tile::new(
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Map a world position to a tile clamped to the grid bounds
    pub fn to_grid_coords(&self, pos: Vec2) -> Tile {
        let tile = self.to_grid_coords_unclamped(pos);
        Tile::new(
            tile.col.clamp(0, self.cols as i32 - 1),
            tile.row.clamp(0, self.rows as i32 - 1),
        )
    }

    /// World position of a tile's center
    pub fn tile_center(&self, tile: Tile) -> Vec2 {
        Vec2::new(
            (tile.col as f32 + 0.5) * self.cell_size,
            (tile.row as f32 + 0.5) * self.cell_size,
        )
    }

    fn index(&self, tile: Tile) -> Option<usize> {
        if tile.col < 0 || tile.row < 0 {
            return None;
        }
        let (col, row) = (tile.col as usize, tile.row as usize);
        if col >= self.cols || row >= self.rows {
            return None;
        }
        Some(row * self.cols + col)
    }

    /// Walkability of a tile, `None` when off-grid
    pub fn get(&self, tile: Tile) -> Option<Walkability> {
        self.index(tile).map(|i| self.tiles[i])
    }

    /// Walkability under a world position, `None` when off-grid
    pub fn walkability_at(&self, pos: Vec2) -> Option<Walkability> {
        self.get(self.to_grid_coords_unclamped(pos))
    }

    /// Player movement check: off-grid and UNWALKABLE refuse
    pub fn player_can_enter(&self, pos: Vec2) -> bool {
        self.walkability_at(pos)
            .is_some_and(Walkability::player_can_walk)
    }

    /// Autonomous movement check: off-grid and either unwalkable state refuse
    pub fn ai_can_enter(&self, pos: Vec2) -> bool {
        self.walkability_at(pos).is_some_and(Walkability::ai_can_walk)
    }

    /// Set a tile; off-grid tiles are ignored
    pub fn set_tile(&mut self, tile: Tile, value: Walkability) {
        let Some(i) = self.index(tile) else {
            log::debug!("set_tile ignored off-grid tile {tile:?}");
            return;
        };
        self.tiles[i] = value;
        self.sync_pathfinder();
    }

    /// Cycle a tile to its next walkability state
    pub fn toggle_tile(&mut self, tile: Tile) {
        if let Some(current) = self.get(tile) {
            self.set_tile(tile, current.next());
        }
    }

    /// Mark the tiles under a static obstacle as AI-unwalkable.
    ///
    /// Tiles already UNWALKABLE are left alone. The nearest-walkable search
    /// radius grows to cover the largest footprint seen.
    pub fn mark_footprint_unwalkable(&mut self, entity: &Entity) {
        let (top_left, bottom_right) = entity.world_rect();
        // Exclusive bottom-right edge
        let inset = Vec2::splat(self.cell_size * 0.001);
        let first = self.to_grid_coords(top_left);
        let last = self.to_grid_coords(bottom_right - inset);

        for row in first.row..=last.row {
            for col in first.col..=last.col {
                if let Some(i) = self.index(Tile::new(col, row)) {
                    if self.tiles[i] == Walkability::Walkable {
                        self.tiles[i] = Walkability::AiUnwalkable;
                    }
                }
            }
        }

        let span = (last.col - first.col + 1).max(last.row - first.row + 1);
        self.pathfinder.grow_search_radius(span / 2 + 1);
        self.sync_pathfinder();
    }

    fn sync_pathfinder(&mut self) {
        self.pathfinder.sync(&self.tiles);
    }

    /// Override the nearest-walkable search radius (tiles)
    pub fn set_search_radius(&mut self, radius: i32) {
        self.pathfinder.set_search_radius(radius);
    }

    /// Find a waypoint list from `start` to `end` in world space.
    ///
    /// Unwalkable endpoints are replaced by the nearest walkable tile within
    /// the search radius. Start and end on the same tile yields a single
    /// waypoint at the true destination.
    pub fn find_path(&self, start: Vec2, end: Vec2) -> Result<Vec<Vec2>, PathError> {
        let from = self
            .pathfinder
            .nearest_walkable(self.to_grid_coords(start))?;
        let to = self.pathfinder.nearest_walkable(self.to_grid_coords(end))?;

        if from == to {
            return Ok(vec![end]);
        }

        let tiles = self
            .pathfinder
            .search(from, to)
            .ok_or(PathError::NoRoute { from, to })?;

        // First tile is where we already stand
        Ok(tiles
            .into_iter()
            .skip(1)
            .map(|tile| self.tile_center(tile))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid_from(rows: &[&[u8]]) -> WalkGrid {
        let rows: Vec<Vec<Walkability>> = rows
            .iter()
            .map(|r| r.iter().map(|&v| Walkability::try_from(v).unwrap()).collect())
            .collect();
        WalkGrid::from_rows(&rows, 8.0).unwrap()
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let rows = vec![vec![Walkability::Walkable; 3], vec![Walkability::Walkable; 2]];
        let err = WalkGrid::from_rows(&rows, 8.0).unwrap_err();
        assert!(matches!(err, SimError::RaggedGrid { row: 1, .. }));
        assert!(matches!(
            WalkGrid::from_rows(&[], 8.0),
            Err(SimError::EmptyGrid)
        ));
    }

    #[test]
    fn test_invalid_walkability_value() {
        assert!(matches!(
            Walkability::try_from(7),
            Err(SimError::InvalidWalkability(7))
        ));
    }

    #[test]
    fn test_unclamped_distinguishes_off_grid() {
        let grid = WalkGrid::open(4, 4, 8.0);
        let off = Vec2::new(-5.0, 40.0);
        assert_eq!(grid.to_grid_coords_unclamped(off), Tile::new(-1, 5));
        assert_eq!(grid.to_grid_coords(off), Tile::new(0, 3));
        assert_eq!(grid.walkability_at(off), None);
        assert!(!grid.player_can_enter(off));
    }

    #[test]
    fn test_tile_center_round_trips() {
        let grid = WalkGrid::open(10, 10, 8.0);
        let tile = Tile::new(3, 7);
        assert_eq!(grid.to_grid_coords(grid.tile_center(tile)), tile);
    }

    #[test]
    fn test_nan_position_is_clamped() {
        let grid = WalkGrid::open(4, 4, 8.0);
        let tile = grid.to_grid_coords(Vec2::new(f32::NAN, f32::NAN));
        assert!(grid.get(tile).is_some());
    }

    #[test]
    fn test_set_and_toggle_off_grid_is_noop() {
        let mut grid = WalkGrid::open(2, 2, 8.0);
        grid.set_tile(Tile::new(5, 5), Walkability::Unwalkable);
        grid.toggle_tile(Tile::new(-1, 0));
        grid.toggle_tile(Tile::new(1, 1));
        assert_eq!(grid.get(Tile::new(1, 1)), Some(Walkability::AiUnwalkable));
        grid.toggle_tile(Tile::new(1, 1));
        assert_eq!(grid.get(Tile::new(1, 1)), Some(Walkability::Unwalkable));
        assert!(!grid.pathfinder().is_walkable(Tile::new(1, 1)));
    }

    #[test]
    fn test_player_crosses_ai_unwalkable() {
        let grid = grid_from(&[&[0, 1, 2]]);
        assert!(grid.player_can_enter(Vec2::new(12.0, 4.0)));
        assert!(!grid.ai_can_enter(Vec2::new(12.0, 4.0)));
        assert!(!grid.player_can_enter(Vec2::new(20.0, 4.0)));
    }

    #[test]
    fn test_find_path_same_tile_targets_true_destination() {
        let grid = WalkGrid::open(4, 4, 8.0);
        let end = Vec2::new(6.5, 1.5);
        let path = grid.find_path(Vec2::new(1.0, 1.0), end).unwrap();
        assert_eq!(path, vec![end]);
    }

    #[test]
    fn test_find_path_corrects_unwalkable_endpoints() {
        // Both endpoints unwalkable, each with a walkable tile nearby
        let mut grid = grid_from(&[
            &[2, 2, 2, 2, 2, 2],
            &[2, 2, 0, 0, 2, 2],
            &[2, 2, 2, 2, 2, 2],
        ]);
        grid.set_search_radius(2);
        let start = grid.tile_center(Tile::new(1, 1));
        let end = grid.tile_center(Tile::new(4, 1));
        let path = grid.find_path(start, end).unwrap();
        assert_eq!(path, vec![grid.tile_center(Tile::new(3, 1))]);
    }

    #[test]
    fn test_find_path_fails_without_nearby_walkable() {
        let mut grid = grid_from(&[&[2, 2, 2, 2, 2, 0]]);
        grid.set_search_radius(1);
        let err = grid
            .find_path(Vec2::new(4.0, 4.0), Vec2::new(44.0, 4.0))
            .unwrap_err();
        assert!(matches!(err, PathError::NoWalkableTile { .. }));
    }

    #[test]
    fn test_find_path_no_route() {
        let grid = grid_from(&[&[0, 2, 0]]);
        let err = grid
            .find_path(Vec2::new(4.0, 4.0), Vec2::new(20.0, 4.0))
            .unwrap_err();
        assert!(matches!(err, PathError::NoRoute { .. }));
    }

    proptest! {
        #[test]
        fn prop_to_grid_coords_always_in_bounds(
            x in -10_000.0f32..10_000.0,
            y in -10_000.0f32..10_000.0,
            cols in 1usize..64,
            rows in 1usize..64,
        ) {
            let grid = WalkGrid::open(cols, rows, 8.0);
            let tile = grid.to_grid_coords(Vec2::new(x, y));
            prop_assert!(tile.col >= 0 && tile.col < cols as i32);
            prop_assert!(tile.row >= 0 && tile.row < rows as i32);
        }
    }
}
