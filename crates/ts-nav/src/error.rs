//! Navigation-subsystem error type.

use thiserror::Error;

/// Errors produced by `ts-nav`.
///
/// Pathfinding itself never fails: an unreachable destination yields a path
/// that stops moving.  Errors come from building tile maps.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("building {id} does not fit the map: {reason}")]
    InvalidBuilding { id: String, reason: String },

    #[error("building CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NavResult<T> = Result<T, NavError>;
