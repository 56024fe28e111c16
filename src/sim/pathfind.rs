//! Grid search and waypoint paths
//!
//! A* over the walkability grid with 8-way movement. Diagonal steps are only
//! taken when both orthogonal neighbours are open, so paths never cut corners.

use glam::Vec2;
use pathfinding::prelude::astar;

use super::entity::EntityId;
use super::grid::{Tile, Walkability};
use crate::error::PathError;

const STRAIGHT_COST: u32 = 10;
const DIAGONAL_COST: u32 = 14;

/// Finite, non-restartable waypoint sequence with a monotonic cursor
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    points: Vec<Vec2>,
    cursor: usize,
}

impl Path {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points, cursor: 0 }
    }

    /// Waypoint currently being walked toward, `None` once arrived
    pub fn next_point(&self) -> Option<Vec2> {
        self.points.get(self.cursor).copied()
    }

    /// Move the cursor forward; saturates at the end
    pub fn advance(&mut self) {
        if self.cursor < self.points.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.points.len()
    }
}

/// Pathfinding request stored on the actor that issued it.
///
/// The world resolves pending requests after the entity update stage; the
/// actor consumes the result on its next update. `target` is the entity the
/// request was made for, so results for an abandoned target are discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum PathRequest {
    Pending {
        target: EntityId,
        from: Vec2,
        to: Vec2,
    },
    Resolved {
        target: EntityId,
        result: Result<Vec<Vec2>, PathError>,
    },
}

impl PathRequest {
    pub fn target(&self) -> EntityId {
        match self {
            PathRequest::Pending { target, .. } | PathRequest::Resolved { target, .. } => *target,
        }
    }
}

/// The pathfinder's own copy of AI walkability
#[derive(Debug, Clone)]
pub struct Pathfinder {
    cols: usize,
    rows: usize,
    open: Vec<bool>,
    search_radius: i32,
}

impl Pathfinder {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            open: vec![true; cols * rows],
            search_radius: 1,
        }
    }

    /// Replace the walkability copy
    pub fn sync(&mut self, tiles: &[Walkability]) {
        if tiles.len() != self.open.len() {
            log::error!(
                "pathfinder sync size mismatch: {} tiles for {}x{} grid",
                tiles.len(),
                self.cols,
                self.rows
            );
            return;
        }
        for (open, tile) in self.open.iter_mut().zip(tiles) {
            *open = tile.ai_can_walk();
        }
    }

    pub fn set_search_radius(&mut self, radius: i32) {
        self.search_radius = radius.max(0);
    }

    /// Widen the search radius (never shrinks)
    pub fn grow_search_radius(&mut self, radius: i32) {
        self.search_radius = self.search_radius.max(radius);
    }

    fn index(&self, tile: Tile) -> Option<usize> {
        if tile.col < 0 || tile.row < 0 {
            return None;
        }
        let (col, row) = (tile.col as usize, tile.row as usize);
        (col < self.cols && row < self.rows).then(|| row * self.cols + col)
    }

    pub fn is_walkable(&self, tile: Tile) -> bool {
        self.index(tile).is_some_and(|i| self.open[i])
    }

    /// The tile itself if walkable, else the closest walkable tile within
    /// the search radius (ties go to the first in row-major scan order)
    pub fn nearest_walkable(&self, tile: Tile) -> Result<Tile, PathError> {
        if self.is_walkable(tile) {
            return Ok(tile);
        }
        let r = self.search_radius;
        let mut best: Option<(i32, Tile)> = None;
        for dy in -r..=r {
            for dx in -r..=r {
                let candidate = Tile::new(tile.col + dx, tile.row + dy);
                if !self.is_walkable(candidate) {
                    continue;
                }
                let dist_sq = dx * dx + dy * dy;
                if best.is_none_or(|(d, _)| dist_sq < d) {
                    best = Some((dist_sq, candidate));
                }
            }
        }
        best.map(|(_, t)| t).ok_or(PathError::NoWalkableTile { tile })
    }

    fn heuristic(&self, a: Tile, b: Tile) -> u32 {
        let dx = (a.col - b.col).unsigned_abs();
        let dy = (a.row - b.row).unsigned_abs();
        let (lo, hi) = if dx < dy { (dx, dy) } else { (dy, dx) };
        DIAGONAL_COST * lo + STRAIGHT_COST * (hi - lo)
    }

    /// Open neighbours of `tile` with their step costs
    fn successors(&self, tile: Tile) -> Vec<(Tile, u32)> {
        let mut out = Vec::with_capacity(8);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let neighbor = Tile::new(tile.col + dx, tile.row + dy);
                if !self.is_walkable(neighbor) {
                    continue;
                }
                let diagonal = dx != 0 && dy != 0;
                if diagonal
                    && (!self.is_walkable(Tile::new(tile.col + dx, tile.row))
                        || !self.is_walkable(Tile::new(tile.col, tile.row + dy)))
                {
                    continue;
                }
                out.push((neighbor, if diagonal { DIAGONAL_COST } else { STRAIGHT_COST }));
            }
        }
        out
    }

    /// A* between two walkable tiles, inclusive of both ends.
    ///
    /// Returns `None` if either end is blocked or no route exists.
    pub fn search(&self, start: Tile, goal: Tile) -> Option<Vec<Tile>> {
        if !self.is_walkable(start) || !self.is_walkable(goal) {
            return None;
        }
        if start == goal {
            return Some(vec![start]);
        }
        astar(
            &start,
            |&tile| self.successors(tile),
            |&tile| self.heuristic(tile, goal),
            |&tile| tile == goal,
        )
        .map(|(path, _)| path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pathfinder(rows: &[&[u8]]) -> Pathfinder {
        let cols = rows[0].len();
        let tiles: Vec<Walkability> = rows
            .iter()
            .flat_map(|r| r.iter().map(|&v| Walkability::try_from(v).unwrap()))
            .collect();
        let mut pf = Pathfinder::new(cols, rows.len());
        pf.sync(&tiles);
        pf
    }

    #[test]
    fn test_path_cursor_ends_with_none() {
        let mut path = Path::new(vec![Vec2::ZERO, Vec2::ONE]);
        assert_eq!(path.next_point(), Some(Vec2::ZERO));
        path.advance();
        assert_eq!(path.next_point(), Some(Vec2::ONE));
        path.advance();
        assert!(path.is_finished());
        assert_eq!(path.next_point(), None);
        path.advance();
        assert_eq!(path.cursor(), 2);
    }

    #[test]
    fn test_straight_line_search() {
        let pf = pathfinder(&[&[0, 0, 0, 0]]);
        let path = pf.search(Tile::new(0, 0), Tile::new(3, 0)).unwrap();
        assert_eq!(path.first(), Some(&Tile::new(0, 0)));
        assert_eq!(path.last(), Some(&Tile::new(3, 0)));
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_diagonal_allowed_in_open_field() {
        let pf = pathfinder(&[&[0, 0, 0], &[0, 0, 0], &[0, 0, 0]]);
        let path = pf.search(Tile::new(0, 0), Tile::new(2, 2)).unwrap();
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_no_corner_cutting() {
        // Diagonal from (0,0) to (1,1) would squeeze between two blocked tiles
        let pf = pathfinder(&[&[0, 1], &[1, 0]]);
        assert!(pf.search(Tile::new(0, 0), Tile::new(1, 1)).is_none());
    }

    #[test]
    fn test_routes_around_wall() {
        let pf = pathfinder(&[
            &[0, 0, 0, 0, 0],
            &[0, 1, 1, 1, 0],
            &[0, 0, 0, 1, 0],
        ]);
        let path = pf.search(Tile::new(2, 2), Tile::new(4, 2)).unwrap();
        assert!(path.iter().all(|t| pf.is_walkable(*t)));
        assert_eq!(path.last(), Some(&Tile::new(4, 2)));
        // Only route: back out west, along the top, down the east side
        assert_eq!(path.len(), 11);
    }

    #[test]
    fn test_search_takes_cheapest_route() {
        // Straight along the row beats a detour through two diagonals
        let pf = pathfinder(&[&[0, 0, 0], &[0, 0, 0]]);
        let path = pf.search(Tile::new(0, 0), Tile::new(2, 0)).unwrap();
        assert_eq!(path, vec![Tile::new(0, 0), Tile::new(1, 0), Tile::new(2, 0)]);
        assert_eq!(pf.search(Tile::new(1, 0), Tile::new(1, 0)), Some(vec![Tile::new(1, 0)]));
    }

    #[test]
    fn test_ai_unwalkable_blocks_search() {
        let pf = pathfinder(&[&[0, 1, 0]]);
        assert!(pf.search(Tile::new(0, 0), Tile::new(2, 0)).is_none());
    }

    #[test]
    fn test_nearest_walkable_prefers_closest() {
        let mut pf = pathfinder(&[&[0, 1, 1, 1, 0, 0]]);
        pf.set_search_radius(3);
        assert_eq!(pf.nearest_walkable(Tile::new(3, 0)), Ok(Tile::new(4, 0)));
        pf.set_search_radius(0);
        assert!(pf.nearest_walkable(Tile::new(3, 0)).is_err());
    }

    proptest! {
        #[test]
        fn prop_advance_is_monotonic(len in 0usize..20, steps in 0usize..40) {
            let mut path = Path::new(vec![Vec2::ZERO; len]);
            let mut last = path.cursor();
            for _ in 0..steps {
                path.advance();
                let now = path.cursor();
                if last < len {
                    prop_assert_eq!(now, last + 1);
                } else {
                    prop_assert_eq!(now, len);
                }
                last = now;
            }
            prop_assert_eq!(path.next_point().is_none(), path.cursor() >= len);
        }
    }
}
