//! Time-stamped movement paths.
//!
//! A [`Path`] is what the navigator produces and what the occupancy index
//! consumes.  Between two consecutive waypoints an agent moves in a straight
//! line at constant speed; after the last waypoint it stays put.

use serde::{Deserialize, Serialize};

use crate::{Point, Timestamp};

/// One corner of a path: where the agent is at `time`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub time:     Timestamp,
    pub location: Point,
}

impl Waypoint {
    #[inline]
    pub const fn new(time: Timestamp, location: Point) -> Self {
        Self { time, location }
    }
}

/// Ordered waypoints with non-decreasing timestamps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    pub waypoints: Vec<Waypoint>,
}

impl Path {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints }
    }

    /// A one-waypoint path: standing at `location` from `time` on.
    pub fn stationary(location: Point, time: Timestamp) -> Self {
        Self { waypoints: vec![Waypoint::new(time, location)] }
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn first(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }

    pub fn last(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    /// Time at which the agent comes to rest.
    pub fn arrival(&self) -> Option<Timestamp> {
        self.last().map(|w| w.time)
    }

    /// `true` if the path never changes location.
    pub fn is_stationary(&self) -> bool {
        match self.first() {
            Some(first) => self.waypoints.iter().all(|w| w.location == first.location),
            None => true,
        }
    }
}
