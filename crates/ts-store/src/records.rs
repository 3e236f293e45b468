//! The concrete documents of a town: agents, objects, resources, terrain
//! markers, occupancy intervals and cell locks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ts_core::{AgentId, CellId, ObjectId, Path, Point, Rect, ResourceKind, Timestamp, cell_of, cells_for_rect};
use ts_occupancy::{OccupancyInterval, position_at};
use ts_terrain::{ResourceNode, TerrainTileRecord};

use crate::{Collection, DocIndex, Document};

// ── Agents ────────────────────────────────────────────────────────────────────

/// An autonomous villager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentDoc {
    pub id:          AgentId,
    pub name:        String,
    /// Indexed cell: where the agent is at the end of the last committed tick.
    pub cell:        CellId,
    pub path:        Path,
    /// Requested destination that has not been routed yet.  The scheduler
    /// plans a path to it and clears it.
    pub destination: Option<Point>,
    pub home:        Option<ObjectId>,
    #[serde(default)]
    pub inventory:   BTreeMap<ResourceKind, u32>,
}

impl AgentDoc {
    /// An agent standing still at `location` from `now` on.
    pub fn new(id: AgentId, name: impl Into<String>, location: Point, now: Timestamp, cell_size: f64) -> Self {
        Self {
            id,
            name:        name.into(),
            cell:        cell_of(location, cell_size),
            path:        Path::stationary(location, now),
            destination: None,
            home:        None,
            inventory:   BTreeMap::new(),
        }
    }

    /// Position at `t`.  Before the path starts the agent is at its first
    /// waypoint; an empty path yields `None`.
    pub fn location_at(&self, t: Timestamp) -> Option<Point> {
        position_at(&self.path, t)
    }

    /// `true` once the path's last waypoint has been reached.
    pub fn is_idle(&self, t: Timestamp) -> bool {
        self.destination.is_none() && self.path.arrival().is_none_or(|a| a <= t)
    }

    /// Request travel to `to`.
    pub fn travel_to(&mut self, to: Point) {
        self.destination = Some(to);
    }

    pub fn carried(&self, kind: ResourceKind) -> u32 {
        self.inventory.get(&kind).copied().unwrap_or(0)
    }
}

impl Document for AgentDoc {
    const COLLECTION: Collection = Collection::Agents;

    fn key(&self) -> String {
        self.id.key()
    }

    fn index(&self) -> DocIndex {
        DocIndex::in_cell(self.cell)
    }
}

// ── Objects ───────────────────────────────────────────────────────────────────

/// What a placed object is.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Dwelling,
    Workshop,
    Stockpile,
    DroppedItem,
}

/// A placed world object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectDoc {
    pub id:        ObjectId,
    pub kind:      ObjectKind,
    pub cell:      CellId,
    pub position:  Point,
    pub owner:     Option<AgentId>,
    /// Agents living here.  A dwelling with residents makes its cell part of
    /// every fan-out.
    #[serde(default)]
    pub residents: Vec<AgentId>,
    #[serde(default)]
    pub stock:     BTreeMap<ResourceKind, u32>,
    /// Every cell a large footprint overlaps.  Empty for point-sized objects,
    /// which are indexed by `cell` alone.
    #[serde(default)]
    pub span:      Vec<CellId>,
}

impl ObjectDoc {
    pub fn new(id: ObjectId, kind: ObjectKind, position: Point, cell_size: f64) -> Self {
        Self {
            id,
            kind,
            cell:      cell_of(position, cell_size),
            position,
            owner:     None,
            residents: Vec::new(),
            stock:     BTreeMap::new(),
            span:      Vec::new(),
        }
    }

    /// Index the object in every cell `footprint` overlaps, so each of those
    /// cells' ticks loads it.
    pub fn with_footprint(mut self, footprint: Rect, cell_size: f64) -> Self {
        let mut span = cells_for_rect(footprint, cell_size);
        if !span.contains(&self.cell) {
            span.push(self.cell);
        }
        self.span = span;
        self
    }

    pub fn is_populated(&self) -> bool {
        self.kind == ObjectKind::Dwelling && !self.residents.is_empty()
    }
}

impl Document for ObjectDoc {
    const COLLECTION: Collection = Collection::Objects;

    fn key(&self) -> String {
        self.id.key()
    }

    fn index(&self) -> DocIndex {
        let mut index = DocIndex::in_cell(self.cell);
        if !self.span.is_empty() {
            index.cells = self.span.clone();
        }
        match self.owner {
            Some(owner) => index.with_owner(owner),
            None        => index,
        }
    }
}

// ── Resources ─────────────────────────────────────────────────────────────────

/// A generated resource node together with its indexed cell.
///
/// Terrain tiles and cells are different grids; the cell is fixed when the
/// node is first stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceDoc {
    pub cell: CellId,
    pub node: ResourceNode,
}

impl ResourceDoc {
    pub fn new(node: ResourceNode, cell_size: f64) -> Self {
        Self { cell: node.cell(cell_size), node }
    }
}

impl Document for ResourceDoc {
    const COLLECTION: Collection = Collection::Resources;

    fn key(&self) -> String {
        self.node.id.key()
    }

    fn index(&self) -> DocIndex {
        DocIndex::in_cell(self.cell)
    }
}

// ── Terrain markers ───────────────────────────────────────────────────────────

impl Document for TerrainTileRecord {
    const COLLECTION: Collection = Collection::TerrainTiles;

    fn key(&self) -> String {
        self.tile.key()
    }

    fn index(&self) -> DocIndex {
        DocIndex::default()
    }
}

// ── Occupancy intervals ───────────────────────────────────────────────────────

impl Document for OccupancyInterval {
    const COLLECTION: Collection = Collection::Intervals;

    fn key(&self) -> String {
        OccupancyInterval::key(self)
    }

    fn index(&self) -> DocIndex {
        DocIndex::in_cell(self.cell).with_owner(self.agent).during(self.start, self.end)
    }
}

// ── Cell locks ────────────────────────────────────────────────────────────────

/// Marker that a worker is simulating `cell`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellLock {
    pub cell:        CellId,
    /// Opaque token naming the holder; unique per tick attempt.
    pub holder:      String,
    pub acquired_at: Timestamp,
}

impl CellLock {
    /// A lock younger than `stale_after_ms` still excludes other workers.
    pub fn is_fresh(&self, now: Timestamp, stale_after_ms: i64) -> bool {
        now.millis_since(self.acquired_at) < stale_after_ms
    }
}

impl Document for CellLock {
    const COLLECTION: Collection = Collection::Locks;

    fn key(&self) -> String {
        self.cell.key()
    }

    fn index(&self) -> DocIndex {
        DocIndex::in_cell(self.cell)
    }
}
