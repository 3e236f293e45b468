//! Navigation trait and the default direction-map navigator.
//!
//! # Pluggability
//!
//! `ts-sim` plans paths through the [`Navigator`] trait, so applications can
//! swap in another planner (A*, scripted routes, a test double) without
//! touching the scheduler.

use ts_core::{NavConfig, Path, Point, Timestamp, Waypoint};

use crate::cache::DirectionMapCache;
use crate::tile_map::{CostTable, TileGeometry, TileMap};
use crate::walker::compute_path;
use crate::NavResult;

/// Pluggable path planner.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync`: one navigator is shared by every
/// cell worker.
pub trait Navigator: Send + Sync {
    /// Plan a path from `origin` toward `destination`, departing after `now`.
    ///
    /// An unreachable destination is not an error; it yields a path that
    /// does not move.
    fn plan(&self, origin: Point, destination: Point, now: Timestamp) -> NavResult<Path>;
}

/// Direction-map relaxation plus the tile walker, backed by a shared cache.
pub struct DirectionMapNavigator {
    cache:    DirectionMapCache,
    geometry: TileGeometry,
    config:   NavConfig,
}

impl DirectionMapNavigator {
    pub fn new(map: TileMap, costs: CostTable, config: NavConfig) -> Self {
        Self {
            cache:    DirectionMapCache::new(map, costs),
            geometry: TileGeometry::from_config(&config),
            config,
        }
    }

    pub fn cache(&self) -> &DirectionMapCache {
        &self.cache
    }

    pub fn geometry(&self) -> &TileGeometry {
        &self.geometry
    }
}

impl Navigator for DirectionMapNavigator {
    fn plan(&self, origin: Point, destination: Point, now: Timestamp) -> NavResult<Path> {
        let dm = self.cache.get(self.geometry.tile_of(destination));
        Ok(compute_path(&dm, &self.geometry, origin, now, &self.config))
    }
}

/// Walks in a straight line at horizontal speed, ignoring the map.
///
/// Useful for tests and for open terrain without a tile map.
pub struct StraightLineNavigator {
    pub config: NavConfig,
}

impl Navigator for StraightLineNavigator {
    fn plan(&self, origin: Point, destination: Point, now: Timestamp) -> NavResult<Path> {
        let start = now + self.config.lead_time_ms;
        if origin == destination {
            return Ok(Path::stationary(origin, start));
        }
        let tiles = origin.distance(destination) / self.config.tile_unit;
        let duration = (tiles * self.config.horizontal_step_ms as f64).ceil() as i64;
        Ok(Path::new(vec![
            Waypoint::new(start, origin),
            Waypoint::new(start + duration.max(1), destination),
        ]))
    }
}
