//! `ts-terrain` — deterministic procedural terrain.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | [`tile`]      | `TerrainTileId`, `TerrainTileRecord`                            |
//! | [`voronoi`]   | Bowyer–Watson triangulation, `voronoi_cells`, `lloyd_relax`     |
//! | [`generator`] | `TerrainGenerator`, `generate_terrain_tile`, `pick_feature`     |
//! | [`resource`]  | `ResourceNode` with depletion / respawn                         |
//! | [`error`]     | `TerrainError`, `TerrainResult<T>`                              |
//!
//! # Generate-on-first-load
//!
//! Tiles are generated lazily, the first time a cell tick touches them.  Because
//! generation is a pure function of `(world_seed, config, tile)`, two workers
//! racing to generate the same tile produce identical documents; the store's
//! transaction guard decides which write lands.  The
//! [`TerrainTileRecord`] marker is committed together with the resources.

pub mod error;
pub mod generator;
pub mod resource;
pub mod tile;
pub mod voronoi;


pub use error::{TerrainError, TerrainResult};
pub use generator::{TerrainGenerator, generate_terrain_tile, pick_feature};
pub use resource::ResourceNode;
pub use tile::{TerrainTileId, TerrainTileRecord};
pub use voronoi::{lloyd_relax, voronoi_cells};
