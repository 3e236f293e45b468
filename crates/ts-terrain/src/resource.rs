//! Harvestable resource nodes and their depletion/respawn cycle.

use serde::{Deserialize, Serialize};

use ts_core::{CellId, Point, ResourceId, ResourceKind, Timestamp, cell_of};

use crate::TerrainTileId;

/// A generated resource point (tree, rock, ore vein, …).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub id:         ResourceId,
    pub kind:       ResourceKind,
    pub tile:       TerrainTileId,
    pub position:   Point,
    pub capacity:   u32,
    pub remaining:  u32,
    pub respawn_ms: i64,
    /// Set when the node is emptied; the node refills at this time.
    pub respawn_at: Option<Timestamp>,
}

impl ResourceNode {
    pub fn cell(&self, cell_size: f64) -> CellId {
        cell_of(self.position, cell_size)
    }

    pub fn is_depleted(&self) -> bool {
        self.remaining == 0
    }

    /// Harvest up to `amount` units.  Returns the units actually taken.
    ///
    /// Emptying the node schedules its respawn `respawn_ms` after `now`.
    pub fn deplete(&mut self, amount: u32, now: Timestamp) -> u32 {
        let taken = amount.min(self.remaining);
        self.remaining -= taken;
        if self.remaining == 0 && self.respawn_at.is_none() {
            self.respawn_at = Some(now + self.respawn_ms);
        }
        taken
    }

    /// Refill the node if its respawn time has come.  Returns `true` if it
    /// refilled.
    pub fn respawn_if_due(&mut self, now: Timestamp) -> bool {
        match self.respawn_at {
            Some(at) if at <= now => {
                self.remaining = self.capacity;
                self.respawn_at = None;
                true
            }
            _ => false,
        }
    }
}
