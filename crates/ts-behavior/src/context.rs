//! Read-only tick parameters passed to every behavior step.

use ts_core::{CellId, SeededRng, Timestamp, mix_seed};

/// What the scheduler knows about the tick being computed.
///
/// Built once per cell tick.  The step sees the cell as of `now` and should
/// describe it as of [`tick_end`](Self::tick_end).
#[derive(Clone, Debug, PartialEq)]
pub struct TickContext {
    pub cell:        CellId,
    /// Start of the simulated span.
    pub now:         Timestamp,
    pub duration_ms: i64,
    pub cell_size:   f64,
    /// Seed for this cell and tick.  Derived from the world seed, the cell
    /// and `now`, so a retried tick replays the same random choices.
    pub seed:        u64,
}

impl TickContext {
    pub fn new(world_seed: u64, cell: CellId, now: Timestamp, duration_ms: i64, cell_size: f64) -> Self {
        let seed = mix_seed(world_seed, &[cell.x as i64 as u64, cell.y as i64 as u64, now.millis() as u64]);
        Self { cell, now, duration_ms, cell_size, seed }
    }

    /// End of the simulated span.
    #[inline]
    pub fn tick_end(&self) -> Timestamp {
        self.now + self.duration_ms
    }

    /// A fresh generator over this tick's seed.
    pub fn rng(&self) -> SeededRng {
        SeededRng::new(self.seed)
    }
}
