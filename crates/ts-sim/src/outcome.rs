//! What a cell tick did.

use ts_core::{CellId, Timestamp};

/// Counters for one committed cell tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub cell:              CellId,
    pub started_at:        Timestamp,
    pub ended_at:          Timestamp,
    /// Transaction attempts, including the one that committed.
    pub attempts:          u32,
    pub agents:            usize,
    pub objects:           usize,
    pub resources:         usize,
    pub agents_written:    usize,
    pub objects_written:   usize,
    pub objects_deleted:   usize,
    pub resources_written: usize,
    pub respawned:         usize,
    pub rerouted:          usize,
    pub intervals_written: usize,
    pub intervals_removed: usize,
    pub tiles_generated:   usize,
}

impl TickReport {
    pub(crate) fn new(cell: CellId, started_at: Timestamp, ended_at: Timestamp) -> Self {
        Self { cell, started_at, ended_at, ..Self::default() }
    }
}

/// Result of asking for one cell tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Committed(TickReport),
    /// Another worker holds a fresh lock on the cell.  Nothing was done;
    /// this is not an error.
    LockHeld { cell: CellId, holder: String },
}

impl TickOutcome {
    pub fn cell(&self) -> CellId {
        match self {
            TickOutcome::Committed(r)         => r.cell,
            TickOutcome::LockHeld { cell, .. } => *cell,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, TickOutcome::Committed(_))
    }

    pub fn report(&self) -> Option<&TickReport> {
        match self {
            TickOutcome::Committed(r) => Some(r),
            TickOutcome::LockHeld { .. } => None,
        }
    }
}

/// Tally of one fan-out round.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub dispatched: usize,
    pub committed:  usize,
    pub lock_held:  usize,
    /// Cells whose tick failed and should be dispatched again.
    pub failed:     Vec<CellId>,
}
