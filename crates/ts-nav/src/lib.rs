//! `ts-nav` — tile maps, direction-map pathfinding, and path walking.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`tile_map`]  | `TileMap`, `CostTable`, `TileCoord`, `TileGeometry`           |
//! | [`builder`]   | `TileMapBuilder`, `Building`, building CSV loaders            |
//! | [`direction`] | `Direction`, `DirectionMap`, `compute_direction_map`          |
//! | [`walker`]    | `compute_path`                                                |
//! | [`cache`]     | `DirectionMapCache`                                           |
//! | [`navigator`] | `Navigator` trait, `DirectionMapNavigator`, `StraightLineNavigator` |
//! | [`error`]     | `NavError`, `NavResult<T>`                                    |
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                     |
//! |-----------|------------------------------------------------------------|
//! | `fx-hash` | FxHash maps in the direction-map cache.                    |

pub mod builder;
pub mod cache;
pub mod direction;
pub mod error;
pub mod navigator;
pub mod tile_map;
pub mod walker;

#[cfg(test)]
mod tests;

pub use builder::{Building, TileMapBuilder, load_buildings_csv, load_buildings_reader};
pub use cache::DirectionMapCache;
pub use direction::{Direction, DirectionCell, DirectionMap, compute_direction_map};
pub use error::{NavError, NavResult};
pub use navigator::{DirectionMapNavigator, Navigator, StraightLineNavigator};
pub use tile_map::{CostTable, TileCoord, TileGeometry, TileMap, class};
pub use walker::compute_path;
