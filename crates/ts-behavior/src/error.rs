use thiserror::Error;

use ts_core::CellId;

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("behavior configuration error: {0}")]
    Config(String),

    /// The step could not produce a state for this cell; the tick is
    /// abandoned and nothing is written.
    #[error("behavior step failed in cell {cell}: {reason}")]
    Step { cell: CellId, reason: String },
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
