//! Cell-time occupancy intervals.

use std::fmt;

use serde::{Deserialize, Serialize};

use ts_core::{AgentId, CellId, Timestamp};

/// "Agent `agent` is attributed to `cell` during `[start, end)`."
///
/// The intervals of one route are numbered `seq = 0, 1, …` in time order,
/// are contiguous, and never place two consecutive entries in the same cell.
/// The last one ends at [`Timestamp::FAR_FUTURE`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyInterval {
    pub agent:   AgentId,
    pub seq:     u32,
    pub cell:    CellId,
    pub start:   Timestamp,
    pub end:     Timestamp,
    /// Set when the agent is re-routed; the interval no longer describes a
    /// planned movement and is awaiting cleanup.
    pub expired: bool,
}

impl OccupancyInterval {
    /// Stable document key: `"agent-7/3"`.
    pub fn key(&self) -> String {
        interval_key(self.agent, self.seq)
    }

    /// `start <= t < end`.
    #[inline]
    pub fn contains(&self, t: Timestamp) -> bool {
        self.start <= t && t < self.end
    }

    /// `true` if `[start, end)` intersects `[from, to)`.
    #[inline]
    pub fn overlaps(&self, from: Timestamp, to: Timestamp) -> bool {
        self.start < to && from < self.end
    }

    /// Due for deletion: re-routed away, or over by `now`.
    #[inline]
    pub fn is_stale(&self, now: Timestamp) -> bool {
        self.expired || self.end < now
    }

    pub fn duration_ms(&self) -> i64 {
        self.end - self.start
    }
}

impl fmt::Display for OccupancyInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{} @ {} [{} .. {})", self.agent, self.seq, self.cell, self.start, self.end)?;
        if self.expired {
            write!(f, " expired")?;
        }
        Ok(())
    }
}

/// Document key for interval `seq` of `agent`.
pub fn interval_key(agent: AgentId, seq: u32) -> String {
    format!("{agent}/{seq}")
}

/// `true` if `intervals` is a well-formed route: contiguous in time, no two
/// consecutive entries in the same cell, sequence numbers `0..n`.
pub fn is_contiguous(intervals: &[OccupancyInterval]) -> bool {
    let numbered = intervals.iter().enumerate().all(|(i, iv)| iv.seq as usize == i);
    let ordered = intervals.iter().all(|iv| iv.start < iv.end);
    let chained = intervals
        .windows(2)
        .all(|w| w[0].end == w[1].start && w[0].cell != w[1].cell && w[0].agent == w[1].agent);
    numbered && ordered && chained
}
