//! Queries for the `scan_history` ring — the last 30 scan snapshots.

use rusqlite::{params, Connection};

use findex_core::errors::StorageError;
use findex_core::models::{IndexStats, ScanHistoryEntry};

use crate::sql_err;

/// Maximum entries retained; older entries are pruned at insert time.
pub const MAX_ENTRIES: usize = 30;

/// Append a stats snapshot and prune the ring back to `MAX_ENTRIES`,
/// keeping the newest ids.
pub fn append(
    conn: &Connection,
    scan_time: i64,
    stats: &IndexStats,
) -> Result<(), StorageError> {
    let stats_json = serde_json::to_string(stats).map_err(|e| StorageError::Decode {
        message: e.to_string(),
    })?;
    conn.execute(
        "INSERT INTO scan_history (scan_time, stats_json) VALUES (?1, ?2)",
        params![scan_time, stats_json],
    )
    .map_err(sql_err)?;
    conn.execute(
        "DELETE FROM scan_history
         WHERE id NOT IN (
             SELECT id FROM scan_history ORDER BY id DESC LIMIT ?1
         )",
        params![MAX_ENTRIES as i64],
    )
    .map_err(sql_err)?;
    Ok(())
}

/// The newest `limit` entries with deserialized stats, newest first.
pub fn recent(conn: &Connection, limit: usize) -> Result<Vec<ScanHistoryEntry>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT id, scan_time, stats_json
             FROM scan_history ORDER BY scan_time DESC, id DESC LIMIT ?1",
        )
        .map_err(sql_err)?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .map_err(sql_err)?;

    let mut entries = Vec::new();
    for row in rows {
        let (id, scan_time, stats_json) = row.map_err(sql_err)?;
        let stats: IndexStats =
            serde_json::from_str(&stats_json).map_err(|e| StorageError::Decode {
                message: e.to_string(),
            })?;
        entries.push(ScanHistoryEntry {
            id,
            scan_time,
            stats,
        });
    }
    Ok(entries)
}

/// Total entries currently in the ring.
pub fn count(conn: &Connection) -> Result<i64, StorageError> {
    conn.query_row("SELECT COUNT(*) FROM scan_history", [], |row| row.get(0))
        .map_err(sql_err)
}
