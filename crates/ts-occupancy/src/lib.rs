//! `ts-occupancy` — which cell an agent is in, and when.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                          |
//! |---------------|-------------------------------------------------------------------|
//! | [`interval`]  | `OccupancyInterval`, `interval_key`, `is_contiguous`              |
//! | [`decompose`] | `decompose_into_cell_intervals`, `segment_spans`, `CellSpan`      |
//! | [`position`]  | `position_at`, `cell_at`                                          |
//!
//! # Occupancy model
//!
//! A path is a list of timestamped waypoints.  Rather than store a position
//! per agent and scan every agent to find who is near a cell, each route is
//! decomposed into intervals `(cell, start, end)`.  These are stored as a
//! secondary index: "who may be in cell X during `[t0, t1)`" is a query on
//! intervals by cell and time.
//!
//! 1. On re-route, the agent's old intervals are marked `expired`.
//! 2. The new path is decomposed; the last interval ends at
//!    `Timestamp::FAR_FUTURE` ("resting here until further notice").
//! 3. Cell ticks delete intervals that are expired or have ended.
//!
//! The index is allowed to be briefly stale across cells: it says where an
//! agent *may* be, not where it is under lock.

pub mod decompose;
pub mod interval;
pub mod position;


pub use decompose::{CellSpan, decompose_into_cell_intervals, segment_spans};
pub use interval::{OccupancyInterval, interval_key, is_contiguous};
pub use position::{cell_at, position_at};
