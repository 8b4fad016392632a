//! Queries for the `metadata` key/value table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use findex_core::errors::StorageError;

use crate::sql_err;

/// RFC-3339 timestamp of the last completed scan.
pub const KEY_LAST_SCAN: &str = "last_scan";
/// Serialized `IndexStats` snapshot from the last completed scan.
pub const KEY_STATS_CACHE: &str = "stats_cache";

/// Read a metadata value.
pub fn get(conn: &Connection, key: &str) -> Result<Option<String>, StorageError> {
    conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(sql_err)
}

/// Write a metadata value, replacing any existing one.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO metadata(key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .map_err(sql_err)?;
    Ok(())
}

/// Timestamp of the last completed scan, `None` when the store has never
/// finished one (or holds an unparsable value).
pub fn last_scan(conn: &Connection) -> Result<Option<DateTime<Utc>>, StorageError> {
    Ok(get(conn, KEY_LAST_SCAN)?
        .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
        .map(|t| t.with_timezone(&Utc)))
}

/// Record the completion time of a scan. Advances monotonically because
/// every completed scan stamps the current time.
pub fn set_last_scan(conn: &Connection, now: DateTime<Utc>) -> Result<(), StorageError> {
    set(conn, KEY_LAST_SCAN, &now.to_rfc3339())
}
