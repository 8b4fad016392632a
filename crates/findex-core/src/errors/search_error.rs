//! Query-layer errors.

use super::StorageError;

/// Errors propagated to callers of the query engine.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("unknown index: {name}")]
    UnknownIndex { name: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
