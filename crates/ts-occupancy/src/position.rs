//! Where an agent is along its path at a given moment.

use ts_core::{CellId, Path, Point, Timestamp, cell_of};

/// Linear interpolation along `path` at time `t`.
///
/// Before the first waypoint the agent is at the start; after the last it is
/// at the end.  `None` for an empty path.
pub fn position_at(path: &Path, t: Timestamp) -> Option<Point> {
    let first = path.first()?;
    if t <= first.time {
        return Some(first.location);
    }

    // Index of the first waypoint strictly after `t`.
    let next = path.waypoints.partition_point(|w| w.time <= t);
    let Some(b) = path.waypoints.get(next) else {
        return path.last().map(|w| w.location);
    };
    let a = &path.waypoints[next - 1];

    let span = b.time - a.time;
    if span <= 0 {
        return Some(b.location);
    }
    let fraction = (t - a.time) as f64 / span as f64;
    Some(a.location.lerp(b.location, fraction))
}

/// The cell the agent occupies at time `t`.
pub fn cell_at(path: &Path, t: Timestamp, cell_size: f64) -> Option<CellId> {
    position_at(path, t).map(|p| cell_of(p, cell_size))
}
