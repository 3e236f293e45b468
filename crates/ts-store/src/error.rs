//! Error types for ts-store.

use thiserror::Error;

/// Errors that can occur while reading or committing documents.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic-concurrency failure: something this transaction read was
    /// changed by another commit.  Nothing was written; retry from scratch.
    #[error("transaction conflict on {what}")]
    Conflict { what: String },

    #[error("document encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StoreError {
    /// `true` for the transient conflict kind; every other error is fatal
    /// for the operation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;
