//! Tile maps, traversal costs, and tile ↔ world geometry.
//!
//! A [`TileMap`] is a grid of characters, one per tile.  Rows may have
//! different lengths; a tile past the end of a short row does not exist and
//! is treated as impassable.  The character is the tile's class, and a
//! [`CostTable`] maps classes to the cost of stepping *onto* that tile.
//! Classes absent from the table are impassable.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use ts_core::{NavConfig, Point};

/// Standard tile classes produced by [`TileMapBuilder`](crate::TileMapBuilder).
pub mod class {
    pub const ROAD:     char = '=';
    pub const DOOR:     char = 'D';
    pub const INTERIOR: char = 'h';
    pub const WALL:     char = '#';
    pub const EMPTY:    char = '.';
}

// ── TileCoord ─────────────────────────────────────────────────────────────────

/// Column/row address of a tile.  Row 0 is the top row; `y` grows downward.
///
/// Signed so that points left of or above the map still have a coordinate.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.y)
    }
}

// ── TileGeometry ──────────────────────────────────────────────────────────────

/// Placement of the tile grid in world space.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileGeometry {
    /// World position of the top-left corner of tile `(0, 0)`.
    pub origin: Point,
    /// Side length of one tile in world units.
    pub unit:   f64,
}

impl TileGeometry {
    pub const fn new(origin: Point, unit: f64) -> Self {
        Self { origin, unit }
    }

    pub fn from_config(cfg: &NavConfig) -> Self {
        Self::new(cfg.origin, cfg.tile_unit)
    }

    /// The tile containing `p`: `floor((p - origin) / unit)` per axis.
    pub fn tile_of(&self, p: Point) -> TileCoord {
        TileCoord::new(
            ((p.x - self.origin.x) / self.unit).floor() as i32,
            ((p.y - self.origin.y) / self.unit).floor() as i32,
        )
    }

    /// World-space centre of `tile`.
    pub fn center(&self, tile: TileCoord) -> Point {
        Point::new(
            self.origin.x + (tile.x as f64 + 0.5) * self.unit,
            self.origin.y + (tile.y as f64 + 0.5) * self.unit,
        )
    }
}

// ── CostTable ─────────────────────────────────────────────────────────────────

/// Cost of stepping onto each tile class.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostTable {
    costs: HashMap<char, f64>,
}

impl CostTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Costs for the classes emitted by [`TileMapBuilder`](crate::TileMapBuilder).
    /// Walls are left out, so they are impassable.
    pub fn standard() -> Self {
        Self::new()
            .with(class::ROAD, 1.0)
            .with(class::DOOR, 2.0)
            .with(class::INTERIOR, 2.0)
            .with(class::EMPTY, 4.0)
    }

    pub fn with(mut self, tile: char, cost: f64) -> Self {
        self.costs.insert(tile, cost);
        self
    }

    pub fn set(&mut self, tile: char, cost: f64) {
        self.costs.insert(tile, cost);
    }

    /// Cost of stepping onto `tile`, or `None` if it cannot be entered.
    ///
    /// Negative and non-finite costs count as impassable.
    #[inline]
    pub fn cost(&self, tile: char) -> Option<f64> {
        self.costs
            .get(&tile)
            .copied()
            .filter(|c| c.is_finite() && *c >= 0.0)
    }
}

impl FromIterator<(char, f64)> for CostTable {
    fn from_iter<I: IntoIterator<Item = (char, f64)>>(pairs: I) -> Self {
        Self { costs: pairs.into_iter().collect() }
    }
}

// ── TileMap ───────────────────────────────────────────────────────────────────

/// A rectangular-ish grid of tile classes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    rows: Vec<Vec<char>>,
}

impl TileMap {
    /// Parse a map from text, one row per line.  A trailing newline does not
    /// add an empty row; `\r` is stripped.
    pub fn parse(text: &str) -> Self {
        let rows = text
            .lines()
            .map(|line| line.trim_end_matches('\r').chars().collect())
            .collect();
        Self { rows }
    }

    pub fn from_rows(rows: Vec<Vec<char>>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Length of the longest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0
    }

    /// The class at `tile`, or `None` if it lies outside the map or past the
    /// end of its row.
    #[inline]
    pub fn get(&self, tile: TileCoord) -> Option<char> {
        if tile.x < 0 || tile.y < 0 {
            return None;
        }
        self.rows
            .get(tile.y as usize)
            .and_then(|row| row.get(tile.x as usize))
            .copied()
    }

    pub fn rows(&self) -> &[Vec<char>] {
        &self.rows
    }
}

impl fmt::Display for TileMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for ch in row {
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}
