//! `ts-behavior` — the injected behavior step and what it sees.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                        |
//! |-------------|-----------------------------------------------------------------|
//! | [`state`]   | `CellState` — the agents, objects, resources of one cell        |
//! | [`context`] | `TickContext` — cell, time span, cell size, per-tick seed       |
//! | [`step`]    | `BehaviorStep` trait (also implemented for closures)            |
//! | [`noop`]    | `NoopBehavior` — passes the state through                       |
//! | [`error`]   | `BehaviorError`, `BehaviorResult<T>`                            |
//!
//! # Design notes
//!
//! Game rules (what villagers decide, how inventories change) are a black
//! box to the scheduler.  `ts-sim` runs each cell tick as:
//!
//! 1. **Load**: read the cell's documents into a `CellState`.
//! 2. **Step**: `BehaviorStep::step(state, &ctx)`; no store access.
//! 3. **Commit**: diff the returned state against what was loaded, plan
//!    paths for agents with a new destination, and write everything in one
//!    transaction.
//!
//! Because the step cannot touch the store, a conflicted commit can simply
//! run it again.

pub mod context;
pub mod error;
pub mod noop;
pub mod state;
pub mod step;


pub use context::TickContext;
pub use error::{BehaviorError, BehaviorResult};
pub use noop::NoopBehavior;
pub use state::CellState;
pub use step::BehaviorStep;
