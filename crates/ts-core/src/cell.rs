//! Cell grid addressing.
//!
//! The world is partitioned into square cells of side `cell_size`.  A cell is
//! never stored on its own: it is a projection of an entity's position and
//! serves as the partition key for indexing and for parallel simulation.
//!
//! # Model
//!
//! ```text
//! cx = round(x / cell_size)
//! cy = round(y / cell_size)
//! ```
//!
//! so cell `(0, 0)` spans `[-cell_size/2, +cell_size/2)` on both axes.  Ties
//! (points exactly on a half-cell boundary) resolve to the even index, which
//! keeps the mapping symmetric about the origin.
//!
//! # Neighbourhoods
//!
//! Two neighbourhood shapes are provided and each call site picks one:
//!
//! - [`relevant_cells`] — the cell plus the three cells diagonally nearest to
//!   the point (4 cells).  Used for narrow viewport reads so that objects near
//!   a boundary are visible from both sides.
//! - [`neighborhood`] — the full 3×3 block around a cell (9 cells).  Used for
//!   simulation neighbourhoods.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Point, Rect};

/// Integer cell coordinate.  Renders to the canonical key `"cx:cy"`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default, Serialize, Deserialize)]
pub struct CellId {
    pub x: i32,
    pub y: i32,
}

impl CellId {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The cell `(dx, dy)` steps away.
    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> CellId {
        CellId::new(self.x + dx, self.y + dy)
    }

    /// Canonical string key for indexing.
    pub fn key(self) -> String {
        self.to_string()
    }

    /// World-space centre of this cell.
    pub fn center(self, cell_size: f64) -> Point {
        Point::new(self.x as f64 * cell_size, self.y as f64 * cell_size)
    }

    /// World-space bounds of this cell.
    pub fn bounds(self, cell_size: f64) -> Rect {
        let c = self.center(cell_size);
        let h = cell_size * 0.5;
        Rect::new(Point::new(c.x - h, c.y - h), Point::new(c.x + h, c.y + h))
    }

    /// Manhattan distance in cells.
    #[inline]
    pub fn manhattan(self, other: CellId) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

impl FromStr for CellId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: Option<&str>| part.and_then(|p| p.trim().parse::<i32>().ok());
        let mut parts = s.splitn(2, ':');
        match (parse(parts.next()), parse(parts.next())) {
            (Some(x), Some(y)) => Ok(CellId::new(x, y)),
            _ => Err(CoreError::Parse(format!("invalid cell key {s:?}"))),
        }
    }
}

/// Round a cell-space coordinate to its cell index.
#[inline]
fn axis_index(v: f64, cell_size: f64) -> i32 {
    (v / cell_size).round_ties_even() as i32
}

/// The cell containing `point`.
#[inline]
pub fn cell_of(point: Point, cell_size: f64) -> CellId {
    CellId::new(axis_index(point.x, cell_size), axis_index(point.y, cell_size))
}

/// The containing cell plus the three cells nearest to the point's quadrant.
///
/// Layout: `[containing, horizontal neighbour, vertical neighbour, diagonal]`.
/// A point exactly at a cell centre leans toward `+x` / `+y`.
pub fn relevant_cells(point: Point, cell_size: f64) -> [CellId; 4] {
    let cell = cell_of(point, cell_size);
    let fx = point.x / cell_size - cell.x as f64;
    let fy = point.y / cell_size - cell.y as f64;
    let sx = if fx < 0.0 { -1 } else { 1 };
    let sy = if fy < 0.0 { -1 } else { 1 };
    [cell, cell.offset(sx, 0), cell.offset(0, sy), cell.offset(sx, sy)]
}

/// The 3×3 block centred on `cell`.
///
/// Layout (`+y` is south):
///
/// ```text
/// [0] NW | [1] N      | [2] NE
/// [3] W  | [4] centre | [5] E
/// [6] SW | [7] S      | [8] SE
/// ```
pub fn neighborhood(cell: CellId) -> [CellId; 9] {
    [
        cell.offset(-1, -1),
        cell.offset(0, -1),
        cell.offset(1, -1),
        cell.offset(-1, 0),
        cell,
        cell.offset(1, 0),
        cell.offset(-1, 1),
        cell.offset(0, 1),
        cell.offset(1, 1),
    ]
}

/// Every cell overlapped by `rect`, in row-major order.
///
/// Used for extended entities (parcels, building footprints) that may span
/// several cells.
pub fn cells_for_rect(rect: Rect, cell_size: f64) -> Vec<CellId> {
    let lo = cell_of(rect.min, cell_size);
    let hi = cell_of(rect.max, cell_size);
    let mut cells = Vec::with_capacity(
        ((hi.x - lo.x + 1) * (hi.y - lo.y + 1)).max(1) as usize,
    );
    for y in lo.y..=hi.y {
        for x in lo.x..=hi.x {
            cells.push(CellId::new(x, y));
        }
    }
    cells
}
