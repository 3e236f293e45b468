//! Fan-out: one cell job per populated cell, or per cell of a given batch.
//!
//! Delivery is at-least-once.  A dispatcher may run the same cell twice,
//! even concurrently; the cell lock turns the duplicate into
//! [`TickOutcome::LockHeld`].

use tracing::info;

use ts_behavior::BehaviorStep;
use ts_core::CellId;
use ts_nav::Navigator;
use ts_store::{ObjectDoc, Query, Store, StoreExt};

use crate::{CellSimulator, FanOutReport, SimResult, TickOutcome};

/// A cell job as handed to a [`Dispatcher`].
pub type CellJob<'a> = dyn Fn(CellId) -> SimResult<TickOutcome> + Sync + 'a;

/// Runs a cell job for every cell in a batch.
pub trait Dispatcher {
    /// Results may come back in any order.
    fn dispatch(&self, cells: &[CellId], job: &CellJob<'_>) -> Vec<(CellId, SimResult<TickOutcome>)>;
}

/// Runs jobs one after another on the calling thread.
pub struct InlineDispatcher;

impl Dispatcher for InlineDispatcher {
    fn dispatch(&self, cells: &[CellId], job: &CellJob<'_>) -> Vec<(CellId, SimResult<TickOutcome>)> {
        cells.iter().map(|&cell| (cell, job(cell))).collect()
    }
}

/// Runs jobs on Rayon's global thread pool.
#[cfg(feature = "parallel")]
pub struct RayonDispatcher;

#[cfg(feature = "parallel")]
impl Dispatcher for RayonDispatcher {
    fn dispatch(&self, cells: &[CellId], job: &CellJob<'_>) -> Vec<(CellId, SimResult<TickOutcome>)> {
        use rayon::prelude::*;

        cells.par_iter().map(|&cell| (cell, job(cell))).collect()
    }
}

/// Cells containing at least one populated dwelling, sorted and
/// de-duplicated.
pub fn populated_cells<S: Store + ?Sized>(store: &S) -> SimResult<Vec<CellId>> {
    let objects: Vec<ObjectDoc> = store.snapshot(&Query::All)?;
    let mut cells: Vec<CellId> = objects.iter().filter(|o| o.is_populated()).map(|o| o.cell).collect();
    cells.sort_unstable();
    cells.dedup();
    Ok(cells)
}

impl<S: Store, B: BehaviorStep, N: Navigator> CellSimulator<S, B, N> {
    /// One round: tick every populated cell through `dispatcher`.
    pub fn fan_out<D: Dispatcher + ?Sized>(&self, dispatcher: &D) -> SimResult<FanOutReport> {
        let cells = populated_cells(&self.store)?;
        Ok(self.tick_cells(&cells, dispatcher))
    }

    /// Tick an explicit batch of cells through `dispatcher`.
    ///
    /// Failed cells are listed in the report rather than returned as an
    /// error; each already logged its own failure.
    pub fn tick_cells<D: Dispatcher + ?Sized>(&self, cells: &[CellId], dispatcher: &D) -> FanOutReport {
        let duration = self.config.scheduler.tick_duration_ms;
        let results = dispatcher.dispatch(cells, &|cell| self.run_cell_tick(cell, duration));

        let mut report = FanOutReport { dispatched: results.len(), ..FanOutReport::default() };
        for (cell, result) in results {
            match result {
                Ok(TickOutcome::Committed(_))     => report.committed += 1,
                Ok(TickOutcome::LockHeld { .. })  => report.lock_held += 1,
                Err(_)                            => report.failed.push(cell),
            }
        }
        report.failed.sort_unstable();

        info!(
            dispatched = report.dispatched,
            committed  = report.committed,
            lock_held  = report.lock_held,
            failed     = report.failed.len(),
            "fan-out complete"
        );
        self.observer.on_fan_out_end(&report);
        report
    }
}
