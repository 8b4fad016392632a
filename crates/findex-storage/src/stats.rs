//! Per-index statistics computation.
//!
//! Runs against a single open store, either at end-of-scan (the result is
//! snapshotted into `metadata.stats_cache` and `scan_history`) or live on
//! query. Rows with `mod_time = 0` count everywhere except the year
//! distribution, which treats 0 as a missing timestamp.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use findex_core::errors::StorageError;
use findex_core::models::{ExtensionStats, FileRecord, IndexStats, SizeRange, YearStats};

use crate::queries::{files, metadata};
use crate::sql_err;

const TOP_FILES: i64 = 10;
const TOP_EXTENSIONS: i64 = 15;
const TOP_YEARS: i64 = 10;

const GIB: i64 = 1024 * 1024 * 1024;

/// The fixed size histogram: `(label, min, max)` with `[min, max)` bounds;
/// a negative max means unbounded.
pub const SIZE_BUCKETS: [(&str, i64, i64); 7] = [
    ("< 1 KB", 0, 1024),
    ("1 KB - 100 KB", 1024, 100 * 1024),
    ("100 KB - 1 MB", 100 * 1024, 1024 * 1024),
    ("1 MB - 10 MB", 1024 * 1024, 10 * 1024 * 1024),
    ("10 MB - 100 MB", 10 * 1024 * 1024, 100 * 1024 * 1024),
    ("100 MB - 1 GB", 100 * 1024 * 1024, GIB),
    ("> 1 GB", GIB, -1),
];

/// Compute the full statistics of one index.
pub fn compute_index_stats(
    conn: &Connection,
    index_name: &str,
) -> Result<IndexStats, StorageError> {
    let mut stats = IndexStats {
        name: index_name.to_string(),
        ..IndexStats::default()
    };

    stats.total_files = files::count_files(conn)?;
    stats.total_dirs = files::count_dirs(conn)?;
    stats.total_size = files::total_size(conn)?;
    if stats.total_files > 0 {
        stats.avg_file_size = stats.total_size / stats.total_files;
    }

    let oldest: i64 = conn
        .query_row(
            "SELECT COALESCE(MIN(mod_time), 0) FROM files WHERE is_dir = 0",
            [],
            |row| row.get(0),
        )
        .map_err(sql_err)?;
    if oldest > 0 {
        stats.oldest_file = DateTime::<Utc>::from_timestamp(oldest, 0);
    }
    let newest: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(mod_time), 0) FROM files WHERE is_dir = 0",
            [],
            |row| row.get(0),
        )
        .map_err(sql_err)?;
    if newest > 0 {
        stats.newest_file = DateTime::<Utc>::from_timestamp(newest, 0);
    }

    stats.last_scan = metadata::last_scan(conn)?;

    stats.largest_files = top_files(conn, "size DESC")?;
    stats.recent_files = top_files(conn, "mod_time DESC")?;
    stats.top_extensions = top_extensions(conn, "cnt DESC")?;
    stats.top_ext_by_size = top_extensions(conn, "total_size DESC")?;
    stats.size_distribution = size_distribution(conn)?;
    stats.year_distribution = year_distribution(conn)?;

    Ok(stats)
}

fn top_files(conn: &Connection, order: &str) -> Result<Vec<FileRecord>, StorageError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM files WHERE is_dir = 0 ORDER BY {order} LIMIT {TOP_FILES}",
            files::FILE_COLUMNS
        ))
        .map_err(sql_err)?;
    let rows = stmt
        .query_map([], files::map_file_row)
        .map_err(sql_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
}

fn top_extensions(conn: &Connection, order: &str) -> Result<Vec<ExtensionStats>, StorageError> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT ext, COUNT(*) AS cnt, COALESCE(SUM(size), 0) AS total_size
             FROM files
             WHERE is_dir = 0 AND ext != ''
             GROUP BY ext ORDER BY {order} LIMIT {TOP_EXTENSIONS}"
        ))
        .map_err(sql_err)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ExtensionStats {
                extension: row.get(0)?,
                count: row.get(1)?,
                size: row.get(2)?,
            })
        })
        .map_err(sql_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
}

fn size_distribution(conn: &Connection) -> Result<Vec<SizeRange>, StorageError> {
    let mut buckets = Vec::with_capacity(SIZE_BUCKETS.len());
    for (label, min, max) in SIZE_BUCKETS {
        let (count, size) = if max < 0 {
            conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(size), 0)
                 FROM files WHERE is_dir = 0 AND size >= ?1",
                params![min],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(sql_err)?
        } else {
            conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(size), 0)
                 FROM files WHERE is_dir = 0 AND size >= ?1 AND size < ?2",
                params![min, max],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(sql_err)?
        };
        buckets.push(SizeRange {
            label: label.to_string(),
            count,
            size,
        });
    }
    Ok(buckets)
}

fn year_distribution(conn: &Connection) -> Result<Vec<YearStats>, StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT CAST(strftime('%Y', mod_time, 'unixepoch') AS INTEGER) AS year,
                    COUNT(*) AS cnt,
                    COALESCE(SUM(size), 0) AS total_size
             FROM files
             WHERE is_dir = 0 AND mod_time > 0
             GROUP BY year ORDER BY year DESC LIMIT ?1",
        )
        .map_err(sql_err)?;
    let rows = stmt
        .query_map(params![TOP_YEARS], |row| {
            Ok(YearStats {
                year: row.get(0)?,
                count: row.get(1)?,
                size: row.get(2)?,
            })
        })
        .map_err(sql_err)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)
}
