//! Path → cell-interval decomposition.
//!
//! Each straight segment between two waypoints is split at every cell
//! boundary it crosses.  The crossing count per axis is `|Δcell|` from
//! [`cell_of`], and boundaries sit half a cell either side of a cell's
//! centre, so the `k`-th boundary on an axis is at `(c ± 0.5) · cell_size`
//! where `c` is the cell just left behind.  Working from boundary indices
//! keeps negative velocities exact; there is no remainder arithmetic to go
//! negative.
//!
//! A segment that passes exactly through a cell corner crosses both axes at
//! the same instant.  The zero-length piece in between is dropped.

use serde::{Deserialize, Serialize};

use ts_core::{AgentId, CellId, Path, Timestamp, Waypoint, cell_of};

use crate::OccupancyInterval;

/// A contiguous stretch of one segment spent in one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSpan {
    pub cell:  CellId,
    pub start: Timestamp,
    pub end:   Timestamp,
}

/// Split the straight move `a → b` at each cell boundary.
///
/// Returns at least one span.  Spans are contiguous and cover
/// `[a.time, b.time)`; a zero-duration segment yields one empty span in the
/// destination cell.
pub fn segment_spans(a: &Waypoint, b: &Waypoint, cell_size: f64) -> Vec<CellSpan> {
    let from = cell_of(a.location, cell_size);
    let to = cell_of(b.location, cell_size);
    let duration = b.time - a.time;

    let crossings = from.manhattan(to);
    if crossings == 0 {
        return vec![CellSpan { cell: from, start: a.time, end: b.time }];
    }
    if duration <= 0 {
        return vec![CellSpan { cell: to, start: a.time, end: b.time }];
    }

    let step_x = (to.x - from.x).signum();
    let step_y = (to.y - from.y).signum();
    let dx = b.location.x - a.location.x;
    let dy = b.location.y - a.location.y;

    // Fraction of the segment at which the next boundary on an axis is hit.
    let next_boundary = |c: i32, step: i32, origin: f64, delta: f64| -> f64 {
        let boundary = (c as f64 + 0.5 * step as f64) * cell_size;
        ((boundary - origin) / delta).clamp(0.0, 1.0)
    };

    let mut spans = Vec::with_capacity(crossings as usize + 1);
    let mut cell = from;
    let mut remaining_x = from.x.abs_diff(to.x);
    let mut remaining_y = from.y.abs_diff(to.y);
    let mut since = a.time;

    while remaining_x + remaining_y > 0 {
        let fx = if remaining_x > 0 { next_boundary(cell.x, step_x, a.location.x, dx) } else { f64::INFINITY };
        let fy = if remaining_y > 0 { next_boundary(cell.y, step_y, a.location.y, dy) } else { f64::INFINITY };

        let (next, fraction) = if fx <= fy {
            remaining_x -= 1;
            (cell.offset(step_x, 0), fx)
        } else {
            remaining_y -= 1;
            (cell.offset(0, step_y), fy)
        };

        let crossed_at = (a.time + (fraction * duration as f64).round() as i64).clamp(since, b.time);
        spans.push(CellSpan { cell, start: since, end: crossed_at });
        cell = next;
        since = crossed_at;
    }
    spans.push(CellSpan { cell, start: since, end: b.time });
    spans
}

// ── Coalescing ────────────────────────────────────────────────────────────────

/// Accumulates spans into intervals, merging same-cell neighbours.
struct Coalescer {
    agent:     AgentId,
    intervals: Vec<OccupancyInterval>,
}

impl Coalescer {
    fn push(&mut self, span: CellSpan) {
        if span.end <= span.start {
            return;
        }
        if let Some(last) = self.intervals.last_mut() {
            if last.cell == span.cell {
                last.end = span.end;
                return;
            }
        }
        self.intervals.push(OccupancyInterval {
            agent:   self.agent,
            seq:     self.intervals.len() as u32,
            cell:    span.cell,
            start:   span.start,
            end:     span.end,
            expired: false,
        });
    }
}

/// Decompose `path` into the occupancy intervals of `agent`.
///
/// The result covers `[first waypoint time, FAR_FUTURE)` without gaps: the
/// agent rests in its final cell once the path ends.  An empty path yields
/// no intervals.
pub fn decompose_into_cell_intervals(
    agent:     AgentId,
    path:      &Path,
    cell_size: f64,
) -> Vec<OccupancyInterval> {
    let Some(&first) = path.first() else {
        return Vec::new();
    };

    let mut out = Coalescer { agent, intervals: Vec::with_capacity(path.len() + 1) };
    let mut prev = first;
    for w in &path.waypoints[1..] {
        // Timestamps never run backwards within a route.
        let next = Waypoint::new(w.time.max(prev.time), w.location);
        for span in segment_spans(&prev, &next, cell_size) {
            out.push(span);
        }
        prev = next;
    }
    out.push(CellSpan {
        cell:  cell_of(prev.location, cell_size),
        start: prev.time,
        end:   Timestamp::FAR_FUTURE,
    });

    debug_assert!(crate::is_contiguous(&out.intervals));
    out.intervals
}
