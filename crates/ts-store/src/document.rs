//! Storage-agnostic document model.
//!
//! Every persisted value is a JSON body plus a small [`DocIndex`] the store
//! can filter on without decoding the body.  Typed values implement
//! [`Document`], which fixes their collection, key and index.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use ts_core::{AgentId, CellId, Point, Timestamp, neighborhood, relevant_cells};

use crate::StoreResult;

// ── Collections ───────────────────────────────────────────────────────────────

/// The persisted collections.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum Collection {
    Agents,
    Objects,
    Resources,
    TerrainTiles,
    Intervals,
    Locks,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Agents,
        Collection::Objects,
        Collection::Resources,
        Collection::TerrainTiles,
        Collection::Intervals,
        Collection::Locks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Agents       => "agents",
            Collection::Objects      => "objects",
            Collection::Resources    => "resources",
            Collection::TerrainTiles => "terrain_tiles",
            Collection::Intervals    => "intervals",
            Collection::Locks        => "locks",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Index and raw documents ───────────────────────────────────────────────────

/// Fields a store can query on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocIndex {
    /// Cells the document is attributed to.  Usually one.
    pub cells: Vec<CellId>,
    pub owner: Option<AgentId>,
    /// When the document starts being meaningful, if not always.
    #[serde(default)]
    pub starts_at: Option<Timestamp>,
    /// When the document stops being meaningful, if ever.
    pub expires_at: Option<Timestamp>,
}

impl DocIndex {
    pub fn in_cell(cell: CellId) -> Self {
        Self { cells: vec![cell], ..Self::default() }
    }

    pub fn with_owner(mut self, owner: AgentId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Meaningful during `[start, end)` only.
    pub fn during(mut self, start: Timestamp, end: Timestamp) -> Self {
        self.starts_at = Some(start);
        self.expires_at = Some(end);
        self
    }

    /// `true` if the document's time range intersects `[from, to)`.
    /// Documents without a range are always live.
    pub fn live_during(&self, from: Timestamp, to: Timestamp) -> bool {
        self.starts_at.is_none_or(|s| s < to) && self.expires_at.is_none_or(|e| from < e)
    }
}

/// A document as the store sees it.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDoc {
    pub index: DocIndex,
    pub body:  serde_json::Value,
}

// ── Queries ───────────────────────────────────────────────────────────────────

/// Predicate over [`DocIndex`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    /// Every document in the collection.
    All,
    /// Documents attributed to `cell`.
    InCell(CellId),
    /// Documents attributed to any of `cells` (viewport reads).
    InCells(Vec<CellId>),
    OwnedBy(AgentId),
    /// Documents attributed to `cell` whose time range intersects
    /// `[from, to)`.  "Who may be in this cell during the tick."
    InCellDuring { cell: CellId, from: Timestamp, to: Timestamp },
}

impl Query {
    /// Narrow viewport read: the cell under `point` plus the three cells
    /// toward its nearest corner.
    pub fn viewport(point: Point, cell_size: f64) -> Query {
        Query::InCells(relevant_cells(point, cell_size).to_vec())
    }

    /// The 3×3 block of cells centred on `cell`.
    pub fn around(cell: CellId) -> Query {
        Query::InCells(neighborhood(cell).to_vec())
    }

    pub fn matches(&self, index: &DocIndex) -> bool {
        match self {
            Query::All               => true,
            Query::InCell(c)         => index.cells.contains(c),
            Query::InCells(cs)       => index.cells.iter().any(|c| cs.contains(c)),
            Query::OwnedBy(a)        => index.owner == Some(*a),
            Query::InCellDuring { cell, from, to } => {
                index.cells.contains(cell) && index.live_during(*from, *to)
            }
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::All              => write!(f, "*"),
            Query::InCell(c)        => write!(f, "cell={c}"),
            Query::InCells(cs)      => write!(f, "cells[{}]", cs.len()),
            Query::OwnedBy(a)       => write!(f, "owner={a}"),
            Query::InCellDuring { cell, from, to } => write!(f, "cell={cell}@[{from},{to})"),
        }
    }
}

// ── Typed documents ───────────────────────────────────────────────────────────

/// A value persisted in one collection under a stable key.
pub trait Document: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    fn key(&self) -> String;

    fn index(&self) -> DocIndex;

    fn to_raw(&self) -> StoreResult<RawDoc> {
        Ok(RawDoc { index: self.index(), body: serde_json::to_value(self)? })
    }

    fn from_raw(raw: RawDoc) -> StoreResult<Self> {
        Ok(serde_json::from_value(raw.body)?)
    }
}
