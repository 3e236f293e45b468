//! `ts-core` — foundational types for the `townsim` simulation core.
//!
//! This crate is a dependency of every other `ts-*` crate.  It has no `ts-*`
//! dependencies of its own.
//!
//! # What lives here
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `ObjectId`, `ResourceId`                        |
//! | [`geo`]         | `Point`, `Rect`                                            |
//! | [`cell`]        | `CellId`, `cell_of`, `relevant_cells`, `neighborhood`, `cells_for_rect` |
//! | [`path`]        | `Waypoint`, `Path`                                         |
//! | [`time`]        | `Timestamp`, `Clock`, `SystemClock`, `ManualClock`         |
//! | [`rng`]         | `SeededRng`, `mix_seed`                                  |
//! | [`config`]      | `WorldConfig` and the per-subsystem config sections        |
//! | [`error`]       | `CoreError`, `CoreResult`                                  |

pub mod cell;
pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod path;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use cell::{CellId, cell_of, cells_for_rect, neighborhood, relevant_cells};
pub use config::{
    FeatureWeight, NavConfig, ResourceKind, SchedulerConfig, TerrainConfig, WorldConfig,
};
pub use error::{CoreError, CoreResult};
pub use geo::{Point, Rect};
pub use ids::{AgentId, ObjectId, ResourceId};
pub use path::{Path, Waypoint};
pub use rng::{SeededRng, mix_seed};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
