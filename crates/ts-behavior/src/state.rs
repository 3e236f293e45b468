//! Everything attributed to one cell at the start of a tick.

use ts_core::{AgentId, CellId, ObjectId, Point, ResourceId, ResourceKind};
use ts_occupancy::OccupancyInterval;
use ts_store::{AgentDoc, ObjectDoc, ResourceDoc};

/// The input and output of a [`BehaviorStep`](crate::BehaviorStep).
#[derive(Clone, Debug, PartialEq)]
pub struct CellState {
    pub cell:      CellId,
    pub agents:    Vec<AgentDoc>,
    pub objects:   Vec<ObjectDoc>,
    pub resources: Vec<ResourceDoc>,
    /// Live occupancy intervals in this cell that overlap the tick, including
    /// agents of other cells passing through.  Context only; changes are
    /// ignored.
    pub passing:   Vec<OccupancyInterval>,
}

impl CellState {
    pub fn new(cell: CellId) -> Self {
        Self {
            cell,
            agents:    Vec::new(),
            objects:   Vec::new(),
            resources: Vec::new(),
            passing:   Vec::new(),
        }
    }

    pub fn agent(&self, id: AgentId) -> Option<&AgentDoc> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut AgentDoc> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&ObjectDoc> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut ObjectDoc> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Remove and return an object; the scheduler deletes it at commit.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<ObjectDoc> {
        let i = self.objects.iter().position(|o| o.id == id)?;
        Some(self.objects.remove(i))
    }

    pub fn resource_mut(&mut self, id: ResourceId) -> Option<&mut ResourceDoc> {
        self.resources.iter_mut().find(|r| r.node.id == id)
    }

    /// The closest resource to `from` that still has units left, optionally
    /// of one kind.  Ties go to the lower ID.
    pub fn nearest_available(&self, from: Point, kind: Option<ResourceKind>) -> Option<&ResourceDoc> {
        self.resources
            .iter()
            .filter(|r| !r.node.is_depleted())
            .filter(|r| kind.is_none_or(|k| r.node.kind == k))
            .min_by(|a, b| {
                from.distance(a.node.position)
                    .total_cmp(&from.distance(b.node.position))
                    .then(a.node.id.cmp(&b.node.id))
            })
    }

    /// Agents passing through the cell during the tick, other than those
    /// resident in it.
    pub fn visitors(&self) -> impl Iterator<Item = AgentId> + '_ {
        let mut seen: Vec<AgentId> = Vec::new();
        self.passing.iter().filter_map(move |iv| {
            if self.agent(iv.agent).is_some() || seen.contains(&iv.agent) {
                return None;
            }
            seen.push(iv.agent);
            Some(iv.agent)
        })
    }
}
