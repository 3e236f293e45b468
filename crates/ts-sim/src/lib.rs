//! `ts-sim` — cell-scoped simulation scheduler for townsim.
//!
//! # One cell tick
//!
//! ```text
//! run_cell_tick(cell, duration):
//!   ① Lock     — short transaction: read the cell lock; if another worker's
//!                lock is fresh, return LockHeld.  Otherwise write ours.
//!   ② Load     — generate any missing terrain tiles under the cell; read
//!                agents, objects, resources indexed to the cell; drop
//!                stale intervals; collect the intervals overlapping the
//!                tick; refill due resources.
//!   ③ Compute  — BehaviorStep::step(state); plan a path for every agent
//!                with a new destination and replace its intervals; index
//!                any agent that owns no live interval.
//!   ④ Commit   — write what changed, delete removed objects, release the
//!                lock.  ②–④ are one transaction; on conflict they rerun.
//! ```
//!
//! Cells are never locked jointly.  An agent walking into a neighbouring
//! cell shows up there through its occupancy intervals and its re-indexed
//! cell; both may be briefly stale.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Adds `RayonDispatcher` for fan-out on Rayon's pool.     |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ts_behavior::NoopBehavior;
//! use ts_core::WorldConfig;
//! use ts_nav::StraightLineNavigator;
//! use ts_sim::{CellSimulatorBuilder, InlineDispatcher};
//! use ts_store::MemoryStore;
//!
//! let config = WorldConfig::default();
//! let nav = StraightLineNavigator { config: config.nav.clone() };
//! let sim = CellSimulatorBuilder::new(config, MemoryStore::new(), NoopBehavior, nav).build()?;
//! let report = sim.fan_out(&InlineDispatcher)?;
//! ```

pub mod builder;
pub mod error;
pub mod fanout;
pub mod observer;
pub mod outcome;
pub mod simulator;

#[cfg(test)]
mod tests;

pub use builder::CellSimulatorBuilder;
pub use error::{SimError, SimResult};
#[cfg(feature = "parallel")]
pub use fanout::RayonDispatcher;
pub use fanout::{CellJob, Dispatcher, InlineDispatcher, populated_cells};
pub use observer::{NoopObserver, TickObserver};
pub use outcome::{FanOutReport, TickOutcome, TickReport};
pub use simulator::CellSimulator;
