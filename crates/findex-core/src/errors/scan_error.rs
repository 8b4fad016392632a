//! Scan pipeline errors.
//!
//! Per-entry traversal failures are not represented here; the walker counts
//! and logs them without aborting. A `ScanError` aborts one index's scan.

use std::path::PathBuf;

use super::{ConfigError, StorageError};

/// Errors that abort the scan of a single index.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scan cancelled")]
    Cancelled,
}
