//! Turning a direction map into a time-stamped path.
//!
//! The walker starts on the agent's tile and follows the map one tile at a
//! time.  A straight run collapses into one segment: waypoints are emitted
//! only where the direction changes and where the walk ends.
//!
//! The first waypoint is the agent's actual position at `now + lead_time`.
//! Corners and the final waypoint sit on tile centres.  The walk always
//! terminates: it stops at the destination marker, at an unreachable tile,
//! or after `max_steps` steps.

use tracing::debug;

use ts_core::{NavConfig, Path, Point, Timestamp, Waypoint};

use crate::direction::{Direction, DirectionMap};
use crate::tile_map::TileGeometry;

/// Walk `map` from `origin`, starting the clock at `now + lead_time_ms`.
///
/// An agent already on the destination, or on an unreachable tile, gets a
/// one-waypoint (stationary) path.
pub fn compute_path(
    map:      &DirectionMap,
    geometry: &TileGeometry,
    origin:   Point,
    now:      Timestamp,
    cfg:      &NavConfig,
) -> Path {
    let start = now + cfg.lead_time_ms;
    let mut waypoints = vec![Waypoint::new(start, origin)];

    let mut pos = geometry.tile_of(origin);
    let mut t = start;
    let mut prev: Option<Direction> = None;
    let mut arrived = false;

    for _ in 0..cfg.max_steps {
        let dir = map.direction_at(pos);
        if dir == Direction::Destination {
            arrived = true;
            break;
        }
        if !dir.is_step() {
            break;
        }
        if prev.is_some_and(|p| p != dir) {
            waypoints.push(Waypoint::new(t, geometry.center(pos)));
        }
        pos = dir.step(pos);
        t = t + step_ms(dir, cfg);
        prev = Some(dir);
    }

    if prev.is_some() {
        waypoints.push(Waypoint::new(t, geometry.center(pos)));
    }
    if !arrived && prev.is_some() {
        debug!(
            destination = %map.destination(),
            stopped_at = %pos,
            steps = cfg.max_steps,
            "walk ended before reaching destination"
        );
    }

    Path::new(waypoints)
}

#[inline]
fn step_ms(dir: Direction, cfg: &NavConfig) -> i64 {
    if dir.is_vertical() { cfg.vertical_step_ms } else { cfg.horizontal_step_ms }
}
