//! Direction-map pathfinding.
//!
//! # Algorithm
//!
//! Rather than a priority-queue Dijkstra, the map is solved by repeated
//! relaxation, which is simple and has a fixed, small cost on town-sized
//! maps:
//!
//! 1. Every tile starts at weight `∞` with no direction, except the
//!    destination tile: weight 0, direction [`Direction::Destination`].
//! 2. Up to `rows + columns` passes are made.  In each pass every passable
//!    tile, in row-major order, looks at its four neighbours.  Stepping onto
//!    the tile costs `cost(tile)`, so reaching the destination through
//!    neighbour `n` costs `weight(n) + cost(tile)`.  If that is `<=` the
//!    tile's current weight, the tile takes it and points toward `n`.
//! 3. A pass that changes nothing ends the loop early.
//!
//! # Tie-breaking
//!
//! Because the comparison is `<=`, the **last** neighbour examined among
//! those offering the best weight wins.  The examination order is therefore
//! part of the result.  It depends on the tile's offset to the destination:
//!
//! - the dominant axis is the one with the larger `|Δ|` (x on a tie);
//! - neighbours leading *away* from the destination are examined first, the
//!   minor axis before the major axis; then neighbours leading *toward* it,
//!   again minor before major.
//!
//! So among equally cheap options a traveller prefers to close the larger
//! gap first, and paths are not pulled toward one corner of the map.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tile_map::{CostTable, TileCoord, TileMap};

// ── Direction ─────────────────────────────────────────────────────────────────

/// Per-tile movement instruction.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "right")]
    Right,
    /// This tile is the destination.
    #[serde(rename = "*")]
    Destination,
    /// Unreachable (or impassable) tile.
    #[default]
    #[serde(rename = "")]
    None,
}

impl Direction {
    /// Tile offset of one step.  `(0, 0)` for the non-moving variants.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Destination | Direction::None => (0, 0),
        }
    }

    #[inline]
    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    #[inline]
    pub fn is_step(self) -> bool {
        matches!(self, Direction::Up | Direction::Down | Direction::Left | Direction::Right)
    }

    /// The tile one step from `from`.
    #[inline]
    pub fn step(self, from: TileCoord) -> TileCoord {
        let (dx, dy) = self.delta();
        TileCoord::new(from.x + dx, from.y + dy)
    }

    /// One-character rendering used by [`DirectionMap::render`].
    pub fn glyph(self) -> char {
        match self {
            Direction::Up => '^',
            Direction::Down => 'v',
            Direction::Left => '<',
            Direction::Right => '>',
            Direction::Destination => '*',
            Direction::None => ' ',
        }
    }
}

// ── DirectionCell ─────────────────────────────────────────────────────────────

/// Solver output for one tile.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionCell {
    /// The tile's class, `None` past the end of a short row.
    pub tile:      Option<char>,
    /// Cost to reach the destination; `f64::INFINITY` if unreachable.
    #[serde(with = "weight_serde")]
    pub weight:    f64,
    pub direction: Direction,
}

impl DirectionCell {
    const UNREACHED: DirectionCell = DirectionCell {
        tile:      None,
        weight:    f64::INFINITY,
        direction: Direction::None,
    };
}

/// JSON has no infinity: unreachable weights are written as `null`.
mod weight_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(w: &f64, s: S) -> Result<S::Ok, S::Error> {
        if w.is_finite() { s.serialize_some(w) } else { s.serialize_none() }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::INFINITY))
    }
}

// ── DirectionMap ──────────────────────────────────────────────────────────────

/// A grid parallel to the tile map holding, per tile, the best next step
/// toward one destination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionMap {
    width:       usize,
    height:      usize,
    destination: TileCoord,
    cells:       Vec<DirectionCell>,
}

impl DirectionMap {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn destination(&self) -> TileCoord {
        self.destination
    }

    #[inline]
    fn index(&self, t: TileCoord) -> Option<usize> {
        if t.x < 0 || t.y < 0 || t.x as usize >= self.width || t.y as usize >= self.height {
            return None;
        }
        Some(t.y as usize * self.width + t.x as usize)
    }

    pub fn get(&self, t: TileCoord) -> Option<&DirectionCell> {
        self.index(t).map(|i| &self.cells[i])
    }

    /// Direction at `t`; [`Direction::None`] outside the map.
    #[inline]
    pub fn direction_at(&self, t: TileCoord) -> Direction {
        self.get(t).map_or(Direction::None, |c| c.direction)
    }

    /// Weight at `t`; `∞` outside the map.
    #[inline]
    pub fn weight_at(&self, t: TileCoord) -> f64 {
        self.get(t).map_or(f64::INFINITY, |c| c.weight)
    }

    pub fn is_reachable(&self, t: TileCoord) -> bool {
        self.weight_at(t).is_finite()
    }

    /// `true` if the destination lay inside the map.
    pub fn has_destination(&self) -> bool {
        self.direction_at(self.destination) == Direction::Destination
    }

    /// ASCII rendering, one line per row: `^ v < > *`, space when unreachable.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for (i, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.extend(row.iter().map(|c| c.direction.glyph()));
        }
        out
    }
}

impl fmt::Display for DirectionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

// ── Solver ────────────────────────────────────────────────────────────────────

/// Order in which a tile at `t` examines its neighbours.  The last entry is
/// the preferred one on equal weight.
fn neighbour_order(t: TileCoord, dest: TileCoord) -> [Direction; 4] {
    let dx = dest.x - t.x;
    let dy = dest.y - t.y;
    let (toward_x, away_x) = if dx >= 0 {
        (Direction::Right, Direction::Left)
    } else {
        (Direction::Left, Direction::Right)
    };
    let (toward_y, away_y) = if dy >= 0 {
        (Direction::Down, Direction::Up)
    } else {
        (Direction::Up, Direction::Down)
    };

    if dx.abs() >= dy.abs() {
        [away_y, away_x, toward_y, toward_x]
    } else {
        [away_x, away_y, toward_x, toward_y]
    }
}

/// Compute the direction map for `destination` over `map`.
///
/// A destination outside the map leaves every tile unreachable.
pub fn compute_direction_map(map: &TileMap, costs: &CostTable, destination: TileCoord) -> DirectionMap {
    let width = map.width();
    let height = map.height();

    let mut dm = DirectionMap {
        width,
        height,
        destination,
        cells: vec![DirectionCell::UNREACHED; width * height],
    };
    for y in 0..height {
        for x in 0..width {
            let t = TileCoord::new(x as i32, y as i32);
            dm.cells[y * width + x].tile = map.get(t);
        }
    }

    let Some(dest_idx) = dm.index(destination) else {
        return dm;
    };
    dm.cells[dest_idx].weight = 0.0;
    dm.cells[dest_idx].direction = Direction::Destination;

    for _pass in 0..width + height {
        let mut changed = false;

        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                if idx == dest_idx {
                    continue;
                }
                let Some(step_cost) = dm.cells[idx].tile.and_then(|c| costs.cost(c)) else {
                    continue;
                };
                let t = TileCoord::new(x as i32, y as i32);

                let mut best = dm.cells[idx];
                for dir in neighbour_order(t, destination) {
                    let via = dm.weight_at(dir.step(t));
                    if !via.is_finite() {
                        continue;
                    }
                    let candidate = via + step_cost;
                    if candidate <= best.weight {
                        best.weight = candidate;
                        best.direction = dir;
                    }
                }

                let cell = &mut dm.cells[idx];
                if best.weight != cell.weight || best.direction != cell.direction {
                    *cell = best;
                    changed = true;
                }
            }
        }

        if !changed {
            break;
        }
    }

    dm
}
