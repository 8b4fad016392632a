//! Queries for the `dir_sizes` cache.

use rusqlite::{params, Connection, OptionalExtension};

use findex_core::errors::StorageError;
use findex_core::models::DirInfo;

use crate::sql_err;

/// Cached aggregate for a directory path, if any.
pub fn cached(conn: &Connection, path: &str) -> Result<Option<DirInfo>, StorageError> {
    conn.query_row(
        "SELECT total_size, file_count FROM dir_sizes WHERE path = ?1",
        params![path],
        |row| {
            Ok(DirInfo {
                size: row.get(0)?,
                files: row.get(1)?,
            })
        },
    )
    .optional()
    .map_err(sql_err)
}

/// Write (or replace) the cached aggregate for a directory path.
pub fn upsert(conn: &Connection, path: &str, info: DirInfo) -> Result<(), StorageError> {
    conn.execute(
        "INSERT OR REPLACE INTO dir_sizes (path, total_size, file_count)
         VALUES (?1, ?2, ?3)",
        params![path, info.size, info.files],
    )
    .map_err(sql_err)?;
    Ok(())
}

/// Aggregate size and count over all descendant non-directory rows of
/// `path`. This is the authoritative computation the cache memoizes.
pub fn compute_subtree(conn: &Connection, path: &str) -> Result<DirInfo, StorageError> {
    conn.query_row(
        "SELECT COALESCE(SUM(size), 0), COUNT(*)
         FROM files
         WHERE path LIKE ?1 AND is_dir = 0",
        params![format!("{path}/%")],
        |row| {
            Ok(DirInfo {
                size: row.get(0)?,
                files: row.get(1)?,
            })
        },
    )
    .map_err(sql_err)
}

/// Aggregate over every non-directory row in the store.
pub fn global(conn: &Connection) -> Result<DirInfo, StorageError> {
    conn.query_row(
        "SELECT COALESCE(SUM(size), 0), COUNT(*) FROM files WHERE is_dir = 0",
        [],
        |row| {
            Ok(DirInfo {
                size: row.get(0)?,
                files: row.get(1)?,
            })
        },
    )
    .map_err(sql_err)
}

/// Every directory path in the store, for the background aggregation pass.
pub fn all_directories(conn: &Connection) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT path FROM files WHERE is_dir = 1")
        .map_err(sql_err)?;
    let rows = stmt
        .query_map([], |row| row.get(0))
        .map_err(sql_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
}
