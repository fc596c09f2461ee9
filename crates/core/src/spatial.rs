//! Spatial query service: pure geometric predicates over the grid oracle.

use crate::config::SimConfig;
use crate::geometry::{Position, distance};
use crate::grid::GridOracle;

/// Line-of-sight, projectability, and bounds queries.
///
/// Borrowing wrapper so callers do not have to thread the oracle and the
/// config through every predicate.
#[derive(Clone, Copy)]
pub struct SpatialQuery<'a> {
    grid: &'a dyn GridOracle,
    config: &'a SimConfig,
}

impl<'a> SpatialQuery<'a> {
    pub fn new(grid: &'a dyn GridOracle, config: &'a SimConfig) -> Self {
        Self { grid, config }
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        self.grid.contains(pos)
    }

    pub fn distance(&self, a: Position, b: Position) -> i32 {
        distance(a, b)
    }

    /// Unobstructed straight line between two tiles. Endpoints may be
    /// opaque; every interior tile must be transparent.
    pub fn line_of_sight(&self, from: Position, to: Position) -> bool {
        for pos in BresenhamLine::new(from, to) {
            if pos == from || pos == to {
                continue;
            }
            match self.grid.tile(pos) {
                Some(tile) if !tile.feature.is_opaque() => {}
                _ => return false,
            }
        }
        true
    }

    /// Whether a missile or spell fired at `from` can reach `to`: line of
    /// sight within the maximum sight range.
    pub fn projectable(&self, from: Position, to: Position) -> bool {
        distance(from, to) <= self.config.max_sight && self.line_of_sight(from, to)
    }
}

/// Integer line walker (Bresenham), inclusive of both endpoints.
struct BresenhamLine {
    current: Position,
    target: Position,
    dy: i32,
    dx: i32,
    sy: i32,
    sx: i32,
    err: i32,
    done: bool,
}

impl BresenhamLine {
    fn new(from: Position, to: Position) -> Self {
        let dy = -(to.y - from.y).abs();
        let dx = (to.x - from.x).abs();
        Self {
            current: from,
            target: to,
            dy,
            dx,
            sy: if from.y < to.y { 1 } else { -1 },
            sx: if from.x < to.x { 1 } else { -1 },
            err: dx + dy,
            done: false,
        }
    }
}

impl Iterator for BresenhamLine {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        if self.done {
            return None;
        }
        let out = self.current;
        if self.current == self.target {
            self.done = true;
            return Some(out);
        }
        let e2 = 2 * self.err;
        if e2 >= self.dy {
            self.err += self.dy;
            self.current.x += self.sx;
        }
        if e2 <= self.dx {
            self.err += self.dx;
            self.current.y += self.sy;
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Feature, GridDimensions, Tile};

    /// Minimal oracle: open floor with a configurable wall column.
    struct Strip {
        wall_x: Option<i32>,
    }

    impl GridOracle for Strip {
        fn dimensions(&self) -> GridDimensions {
            GridDimensions::new(10, 40)
        }

        fn tile(&self, pos: Position) -> Option<Tile> {
            if !self.dimensions().contains(pos) {
                return None;
            }
            let mut tile = Tile::floor();
            if Some(pos.x) == self.wall_x {
                tile.feature = Feature::Wall;
            }
            Some(tile)
        }
    }

    #[test]
    fn open_floor_has_sight() {
        let grid = Strip { wall_x: None };
        let config = SimConfig::default();
        let q = SpatialQuery::new(&grid, &config);
        assert!(q.line_of_sight(Position::new(5, 1), Position::new(5, 15)));
        assert!(q.line_of_sight(Position::new(1, 1), Position::new(8, 12)));
    }

    #[test]
    fn walls_block_sight_but_not_as_endpoints() {
        let grid = Strip { wall_x: Some(8) };
        let config = SimConfig::default();
        let q = SpatialQuery::new(&grid, &config);
        assert!(!q.line_of_sight(Position::new(5, 1), Position::new(5, 15)));
        // The wall tile itself can be looked at.
        assert!(q.line_of_sight(Position::new(5, 1), Position::new(5, 8)));
    }

    #[test]
    fn projection_respects_max_sight() {
        let grid = Strip { wall_x: None };
        let config = SimConfig::default();
        let q = SpatialQuery::new(&grid, &config);
        assert!(q.projectable(Position::new(5, 0), Position::new(5, 20)));
        assert!(!q.projectable(Position::new(5, 0), Position::new(5, 21)));
    }

    #[test]
    fn sight_is_symmetric_on_straight_lines() {
        let grid = Strip { wall_x: Some(8) };
        let config = SimConfig::default();
        let q = SpatialQuery::new(&grid, &config);
        let a = Position::new(5, 2);
        let b = Position::new(5, 14);
        assert_eq!(q.line_of_sight(a, b), q.line_of_sight(b, a));
    }
}
