//! Terrain-generation error type.

use thiserror::Error;

use ts_core::CoreError;

/// Errors produced by `ts-terrain`.
///
/// Any error aborts generation of the tile; nothing is emitted, so the tile
/// stays unmarked and a later attempt starts from scratch.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error("tile {tile}: {reason}")]
    Malformed { tile: String, reason: String },
}

pub type TerrainResult<T> = Result<T, TerrainError>;
