//! A no-op behavior: the cell state passes through unchanged.

use crate::{BehaviorResult, BehaviorStep, CellState, TickContext};

/// A [`BehaviorStep`] that returns its input.
///
/// Useful as a placeholder in tests, or for cells that should only have
/// their bookkeeping (respawns, interval cleanup, re-indexing) run.
pub struct NoopBehavior;

impl BehaviorStep for NoopBehavior {
    fn step(&self, state: CellState, _ctx: &TickContext) -> BehaviorResult<CellState> {
        Ok(state)
    }
}
