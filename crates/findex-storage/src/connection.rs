//! Connection helpers — pragma policy and checkpointing.
//!
//! Every connection gets WAL journaling, a 5 second busy timeout, and
//! `case_sensitive_like = ON` so `LIKE` prefix predicates stay predictable
//! while a background writer holds short transactions.

use std::path::Path;

use rusqlite::Connection;

use findex_core::errors::StorageError;

use crate::{migrations, sql_err};

/// Apply the shared pragma set to a connection.
pub fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA case_sensitive_like = ON;
        ",
    )
    .map_err(sql_err)
}

/// Open a store, apply pragmas, and run migrations. Creates the file
/// (and its parent directory) when missing.
pub fn open_store(path: &Path) -> Result<Connection, StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Sqlite {
                message: format!("create store directory {}: {e}", parent.display()),
            })?;
        }
    }
    let conn = Connection::open(path).map_err(sql_err)?;
    apply_pragmas(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory store with the full schema (for testing).
pub fn open_in_memory() -> Result<Connection, StorageError> {
    let conn = Connection::open_in_memory().map_err(sql_err)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Force a full WAL checkpoint (TRUNCATE mode) so the main file holds
/// every committed page before an atomic rename publishes it.
pub fn checkpoint_truncate(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .map_err(sql_err)
}

/// Run `f` inside one transaction, committing on success. The transaction
/// rolls back when dropped on the error path.
pub fn with_transaction<F, T>(conn: &Connection, f: F) -> Result<T, StorageError>
where
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T, StorageError>,
{
    let tx = conn.unchecked_transaction().map_err(sql_err)?;
    let result = f(&tx)?;
    tx.commit().map_err(sql_err)?;
    Ok(result)
}
