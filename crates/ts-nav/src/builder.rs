//! Tile-map construction: base layout plus building footprints.
//!
//! A region's map starts as a road/zone layout (parsed text or a blank fill
//! with roads drawn in) and then has building footprints stamped on top.
//! Each building becomes a ring of walls around an interior with a single
//! door in the ring.
//!
//! # CSV format
//!
//! ```csv
//! id,x,y,width,height,door_x,door_y
//! bakery,2,1,4,3,3,3
//! smithy,8,1,3,3,8,2
//! ```
//!
//! Coordinates are tile columns/rows.  The door must lie on the footprint's
//! outer ring and not on a corner.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::tile_map::{TileCoord, TileMap, class};
use crate::{NavError, NavResult};

// ── Building ──────────────────────────────────────────────────────────────────

/// A rectangular building footprint in tile coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Building {
    pub id:     String,
    pub x:      i32,
    pub y:      i32,
    pub width:  u32,
    pub height: u32,
    pub door_x: i32,
    pub door_y: i32,
}

impl Building {
    pub fn door(&self) -> TileCoord {
        TileCoord::new(self.door_x, self.door_y)
    }

    fn right(&self) -> i32 {
        self.x + self.width as i32 - 1
    }

    fn bottom(&self) -> i32 {
        self.y + self.height as i32 - 1
    }

    fn on_ring(&self, t: TileCoord) -> bool {
        let inside = t.x >= self.x && t.x <= self.right() && t.y >= self.y && t.y <= self.bottom();
        let edge_x = t.x == self.x || t.x == self.right();
        let edge_y = t.y == self.y || t.y == self.bottom();
        inside && (edge_x || edge_y)
    }

    fn is_corner(&self, t: TileCoord) -> bool {
        (t.x == self.x || t.x == self.right()) && (t.y == self.y || t.y == self.bottom())
    }
}

// ── TileMapBuilder ────────────────────────────────────────────────────────────

/// Construct a [`TileMap`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use ts_nav::{Building, TileMapBuilder};
///
/// let mut b = TileMapBuilder::new(10, 6, '.');
/// b.road_row(5, 0, 9);
/// b.add_building(&Building {
///     id: "bakery".into(), x: 2, y: 1, width: 4, height: 4, door_x: 3, door_y: 4,
/// }).unwrap();
/// let map = b.build();
/// assert_eq!(map.height(), 6);
/// ```
#[derive(Clone, Debug)]
pub struct TileMapBuilder {
    width:  usize,
    rows:   Vec<Vec<char>>,
    placed: usize,
}

impl TileMapBuilder {
    /// A `width × height` map filled with `fill`.
    pub fn new(width: usize, height: usize, fill: char) -> Self {
        Self { width, rows: vec![vec![fill; width]; height], placed: 0 }
    }

    /// Start from a text layout.  Short rows are padded with
    /// [`class::EMPTY`] so buildings may be stamped anywhere in the bounding
    /// rectangle.
    pub fn from_layout(text: &str) -> Self {
        let base = TileMap::parse(text);
        let width = base.width();
        let rows = base
            .rows()
            .iter()
            .map(|r| {
                let mut row = r.clone();
                row.resize(width, class::EMPTY);
                row
            })
            .collect();
        Self { width, rows, placed: 0 }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Overwrite one tile.  Out-of-range coordinates are ignored.
    pub fn set(&mut self, tile: TileCoord, class: char) -> &mut Self {
        if let Some(slot) = self.slot(tile) {
            *slot = class;
        }
        self
    }

    /// Draw a horizontal road on row `y` from column `x0` to `x1` inclusive.
    pub fn road_row(&mut self, y: i32, x0: i32, x1: i32) -> &mut Self {
        for x in x0.min(x1)..=x0.max(x1) {
            self.set(TileCoord::new(x, y), class::ROAD);
        }
        self
    }

    /// Draw a vertical road in column `x` from row `y0` to `y1` inclusive.
    pub fn road_col(&mut self, x: i32, y0: i32, y1: i32) -> &mut Self {
        for y in y0.min(y1)..=y0.max(y1) {
            self.set(TileCoord::new(x, y), class::ROAD);
        }
        self
    }

    /// Stamp a building: walls on the ring, interior inside, door on the ring.
    pub fn add_building(&mut self, b: &Building) -> NavResult<&mut Self> {
        let invalid = |reason: &str| NavError::InvalidBuilding { id: b.id.clone(), reason: reason.into() };

        if b.width < 3 || b.height < 3 {
            return Err(invalid("footprint must be at least 3×3"));
        }
        if b.x < 0 || b.y < 0 || b.right() as usize >= self.width || b.bottom() as usize >= self.height() {
            return Err(invalid("footprint extends past the map edge"));
        }
        if !b.on_ring(b.door()) || b.is_corner(b.door()) {
            return Err(invalid("door must be on a wall and not on a corner"));
        }

        for y in b.y..=b.bottom() {
            for x in b.x..=b.right() {
                let t = TileCoord::new(x, y);
                let class = if t == b.door() {
                    class::DOOR
                } else if b.on_ring(t) {
                    class::WALL
                } else {
                    class::INTERIOR
                };
                self.set(t, class);
            }
        }
        self.placed += 1;
        Ok(self)
    }

    /// Stamp every building in `buildings`, stopping at the first invalid one.
    pub fn add_buildings<'a, I>(&mut self, buildings: I) -> NavResult<&mut Self>
    where
        I: IntoIterator<Item = &'a Building>,
    {
        for b in buildings {
            self.add_building(b)?;
        }
        Ok(self)
    }

    pub fn build(self) -> TileMap {
        debug!(width = self.width, height = self.rows.len(), buildings = self.placed, "tile map built");
        TileMap::from_rows(self.rows)
    }

    fn slot(&mut self, t: TileCoord) -> Option<&mut char> {
        if t.x < 0 || t.y < 0 {
            return None;
        }
        self.rows.get_mut(t.y as usize).and_then(|r| r.get_mut(t.x as usize))
    }
}

// ── CSV loading ───────────────────────────────────────────────────────────────

/// Load building footprints from a CSV file.
pub fn load_buildings_csv(path: &Path) -> NavResult<Vec<Building>> {
    let file = std::fs::File::open(path)?;
    load_buildings_reader(file)
}

/// Like [`load_buildings_csv`] but accepts any `Read` source.
pub fn load_buildings_reader<R: Read>(reader: R) -> NavResult<Vec<Building>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let buildings = csv_reader
        .deserialize::<Building>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(buildings)
}
