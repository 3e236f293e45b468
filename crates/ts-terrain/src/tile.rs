//! Terrain tile addressing.
//!
//! Terrain tiles are a coarser grid than simulation cells and use a different
//! convention: tile `(tx, ty)` spans `[tx·s, (tx+1)·s)` on x (likewise y), so
//! the index is `floor(x / s)`, not a rounding.

use std::fmt;

use serde::{Deserialize, Serialize};

use ts_core::{Point, Rect, Timestamp, mix_seed};

/// Integer terrain-tile coordinate.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct TerrainTileId {
    pub x: i32,
    pub y: i32,
}

impl TerrainTileId {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile containing `p`.
    pub fn containing(p: Point, tile_size: f64) -> Self {
        Self::new((p.x / tile_size).floor() as i32, (p.y / tile_size).floor() as i32)
    }

    /// Every tile overlapping `rect`, in row-major order.
    pub fn covering(rect: Rect, tile_size: f64) -> Vec<TerrainTileId> {
        let lo = Self::containing(rect.min, tile_size);
        let hi = Self::containing(rect.max, tile_size);
        let mut tiles = Vec::new();
        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                tiles.push(Self::new(x, y));
            }
        }
        tiles
    }

    /// World-space bounds (half-open).
    pub fn bounds(self, tile_size: f64) -> Rect {
        Rect::from_origin(
            Point::new(self.x as f64 * tile_size, self.y as f64 * tile_size),
            tile_size,
            tile_size,
        )
    }

    /// This tile and its eight neighbours, row-major.
    pub fn with_neighbours(self) -> [TerrainTileId; 9] {
        let mut out = [self; 9];
        let mut i = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                out[i] = Self::new(self.x + dx, self.y + dy);
                i += 1;
            }
        }
        out
    }

    /// Seed for this tile's scatter stream.  Depends only on the world seed
    /// and the tile coordinates.
    pub fn seed(self, world_seed: u64) -> u64 {
        mix_seed(world_seed, &[self.x as i64 as u64, self.y as i64 as u64])
    }

    /// Stable document key, e.g. `"tile-3:7"`.
    pub fn key(self) -> String {
        format!("tile-{self}")
    }
}

impl fmt::Display for TerrainTileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

/// Persisted marker: this tile's resources exist.
///
/// Written in the same transaction as the resources it describes, so a
/// marker never exists without them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainTileRecord {
    pub tile:           TerrainTileId,
    pub generated_at:   Timestamp,
    pub resource_count: usize,
}
