//! Queries for the `files` table and its FTS index.

use rusqlite::{params, Connection, OptionalExtension, Row};

use findex_core::errors::StorageError;
use findex_core::models::FileRecord;

use crate::sql_err;

/// Column list shared by every query that materializes a `FileRecord`.
pub const FILE_COLUMNS: &str =
    "id, index_name, path, name, dir, dir_index, ext, size, mod_time, is_dir";

/// Map one row of `FILE_COLUMNS` into a `FileRecord`.
pub fn map_file_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        index_name: row.get(1)?,
        path: row.get(2)?,
        name: row.get(3)?,
        dir: row.get(4)?,
        dir_index: row.get(5)?,
        ext: row.get(6)?,
        size: row.get(7)?,
        mod_time: row.get(8)?,
        is_dir: row.get(9)?,
    })
}

/// Insert a batch of records in one transaction with `is_searchable = 1`.
/// Duplicate paths within the store are dropped (`ON CONFLICT DO NOTHING`),
/// so re-feeding the same records leaves the row count unchanged.
pub fn upsert_batch(conn: &Connection, files: &[FileRecord]) -> Result<(), StorageError> {
    if files.is_empty() {
        return Ok(());
    }
    let tx = conn.unchecked_transaction().map_err(sql_err)?;
    {
        let mut stmt = tx
            .prepare_cached(
                "INSERT INTO files
                     (path, name, dir, ext, size, mod_time, is_dir, is_searchable,
                      index_name, dir_index)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?9)
                 ON CONFLICT(path) DO NOTHING",
            )
            .map_err(sql_err)?;
        for f in files {
            stmt.execute(params![
                f.path, f.name, f.dir, f.ext, f.size, f.mod_time, f.is_dir,
                f.index_name, f.dir_index,
            ])
            .map_err(sql_err)?;
        }
    }
    tx.commit().map_err(sql_err)
}

/// Reset the searchable flag of every row to 0. A no-op on a fresh temp
/// store; retained for robustness when a store is reused.
pub fn reset_searchable(conn: &Connection) -> Result<(), StorageError> {
    conn.execute("UPDATE files SET is_searchable = 0", [])
        .map_err(sql_err)?;
    Ok(())
}

/// Finalize a scan: promote newly inserted rows, drop legacy rows, and
/// rebuild the FTS index from the surviving rows.
pub fn finalize(conn: &Connection) -> Result<(), StorageError> {
    conn.execute("UPDATE files SET is_searchable = 2 WHERE is_searchable = 1", [])
        .map_err(sql_err)?;
    conn.execute("DELETE FROM files WHERE is_searchable = 0", [])
        .map_err(sql_err)?;
    conn.execute("INSERT INTO files_fts(files_fts) VALUES('delete-all')", [])
        .map_err(sql_err)?;
    conn.execute(
        "INSERT INTO files_fts(rowid, name, path)
         SELECT id, name, path FROM files WHERE is_searchable = 2",
        [],
    )
    .map_err(sql_err)?;
    conn.execute("INSERT INTO files_fts(files_fts) VALUES('optimize')", [])
        .map_err(sql_err)?;
    Ok(())
}

/// Count non-directory rows.
pub fn count_files(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM files WHERE is_dir = 0", [], |row| {
        row.get(0)
    })
    .map_err(sql_err)
}

/// Count directory rows.
pub fn count_dirs(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM files WHERE is_dir = 1", [], |row| {
        row.get(0)
    })
    .map_err(sql_err)
}

/// Count rows in the FTS index.
pub fn count_fts(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM files_fts", [], |row| row.get(0))
        .map_err(sql_err)
}

/// Total size over non-directory rows.
pub fn total_size(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row(
        "SELECT COALESCE(SUM(size), 0) FROM files WHERE is_dir = 0",
        [],
        |row| row.get(0),
    )
    .map_err(sql_err)
}

/// Fetch one record by id.
pub fn by_id(conn: &Connection, id: i64) -> Result<Option<FileRecord>, StorageError> {
    conn.query_row(
        &format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ?1 LIMIT 1"),
        params![id],
        map_file_row,
    )
    .optional()
    .map_err(sql_err)
}

/// Immediate children of a directory, addressed by the CRC32 of its
/// cleaned path plus a prefix predicate on `path`. Directories sort
/// before files, then by name.
pub fn children(
    conn: &Connection,
    dir_index: i64,
    dir_path: &str,
) -> Result<Vec<FileRecord>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {FILE_COLUMNS} FROM files
             WHERE dir_index = ?1 AND path LIKE ?2
             ORDER BY is_dir DESC, name"
        ))
        .map_err(sql_err)?;
    let rows = stmt
        .query_map(params![dir_index, format!("{dir_path}/%")], map_file_row)
        .map_err(sql_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
}

/// Whether a directory has at least one immediate child row.
pub fn has_children(
    conn: &Connection,
    dir_index: i64,
    dir_path: &str,
) -> Result<bool, StorageError> {
    conn.query_row(
        "SELECT EXISTS(
             SELECT 1 FROM files WHERE dir_index = ?1 AND path LIKE ?2
         )",
        params![dir_index, format!("{dir_path}/%")],
        |row| row.get(0),
    )
    .map_err(sql_err)
}

/// The distinct root directories recorded in `files.dir`.
pub fn distinct_roots(conn: &Connection) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn
        .prepare_cached("SELECT DISTINCT dir FROM files WHERE dir != '' ORDER BY dir")
        .map_err(sql_err)?;
    let rows = stmt
        .query_map([], |row| row.get(0))
        .map_err(sql_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
}
