use thiserror::Error;

use ts_behavior::BehaviorError;
use ts_core::{CellId, CoreError};
use ts_nav::NavError;
use ts_store::StoreError;
use ts_terrain::TerrainError;

#[derive(Debug, Error)]
pub enum SimError {
    /// The only failure callers of a cell tick see.  Nothing from the
    /// failed attempt was persisted; dispatching the cell again is safe.
    #[error("cell {cell} could not be simulated; retry later")]
    RetryLater { cell: CellId },

    #[error("lock on cell {cell} was taken over mid-tick")]
    LockLost { cell: CellId },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("terrain error: {0}")]
    Terrain(#[from] TerrainError),

    #[error("navigation error: {0}")]
    Nav(#[from] NavError),

    #[error("behavior error: {0}")]
    Behavior(#[from] BehaviorError),

    #[error("configuration error: {0}")]
    Config(#[from] CoreError),
}

impl SimError {
    pub(crate) fn is_conflict(&self) -> bool {
        matches!(self, SimError::Store(e) if e.is_conflict())
    }
}

pub type SimResult<T> = Result<T, SimError>;
