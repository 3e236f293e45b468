//! The `BehaviorStep` trait — the extension point for game rules.

use crate::{BehaviorResult, CellState, TickContext};

/// Pluggable per-cell rules: `f(cell state) -> cell state'`.
///
/// The scheduler loads everything attributed to one cell, hands it to
/// `step`, and persists the result in the same transaction.  What the step
/// may change and how the scheduler reacts:
///
/// | Change                                     | Effect at commit                          |
/// |--------------------------------------------|-------------------------------------------|
/// | agent fields, inventory                    | agent written back                        |
/// | `AgentDoc::destination` set                | path planned, occupancy intervals replaced |
/// | object added / changed                     | object written                            |
/// | object removed from `objects`              | object deleted                            |
/// | resource depleted / refilled               | resource written                          |
///
/// Agents or resources missing from the returned state are left as stored.
///
/// # Determinism and retries
///
/// A step may run more than once for the same tick if the commit conflicts.
/// It must therefore be a pure function of its inputs: draw randomness from
/// [`TickContext::rng`], never from a global generator or the clock.
///
/// # Example
///
/// ```rust,ignore
/// struct GoHome;
///
/// impl BehaviorStep for GoHome {
///     fn step(&self, mut state: CellState, ctx: &TickContext) -> BehaviorResult<CellState> {
///         for agent in &mut state.agents {
///             if agent.is_idle(ctx.now) {
///                 agent.travel_to(Point::ORIGIN);
///             }
///         }
///         Ok(state)
///     }
/// }
/// ```
pub trait BehaviorStep: Send + Sync {
    fn step(&self, state: CellState, ctx: &TickContext) -> BehaviorResult<CellState>;
}

impl<F> BehaviorStep for F
where
    F: Fn(CellState, &TickContext) -> BehaviorResult<CellState> + Send + Sync,
{
    fn step(&self, state: CellState, ctx: &TickContext) -> BehaviorResult<CellState> {
        self(state, ctx)
    }
}
