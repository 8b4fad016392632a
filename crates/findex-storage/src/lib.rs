//! Embedded SQLite index store.
//!
//! One database file per index, holding the `files` table, an
//! external-content FTS5 index over `(name, path)`, the `metadata`
//! key/value table, the `dir_sizes` cache, and the `scan_history` ring.
//! The scan pipeline writes through a single connection; the query layer
//! opens its own connections with the same pragma policy.

pub mod connection;
pub mod migrations;
pub mod queries;
pub mod stats;

use findex_core::errors::StorageError;

/// Map a rusqlite error into the storage error domain.
pub(crate) fn sql_err(e: rusqlite::Error) -> StorageError {
    StorageError::Sqlite {
        message: e.to_string(),
    }
}
