//! Data models shared across the scan and query layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the `files` table: a filesystem (or in-archive) entry observed
/// by the last completed scan.
///
/// `mod_time` is Unix seconds; `dir_index` is the CRC32 of the cleaned
/// parent path, zero-extended into an i64. The searchable flag never
/// surfaces here; it only exists inside one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRecord {
    pub id: i64,
    pub index_name: String,
    pub path: String,
    pub name: String,
    pub dir: String,
    pub dir_index: i64,
    pub ext: String,
    pub size: i64,
    pub mod_time: i64,
    pub is_dir: bool,
}

/// Aggregate size of a directory subtree: total bytes and file count over
/// all descendant non-directory rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirInfo {
    pub size: i64,
    pub files: i64,
}

/// Per-extension roll-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionStats {
    pub extension: String,
    pub count: i64,
    pub size: i64,
}

/// One bucket of the fixed size histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub label: String,
    pub count: i64,
    pub size: i64,
}

/// Per-year roll-up over file modification times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearStats {
    pub year: i32,
    pub count: i64,
    pub size: i64,
}

/// Statistics of a single index, computed at end-of-scan (and snapshotted
/// into `metadata.stats_cache` / `scan_history`) or live on query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexStats {
    pub name: String,
    pub total_files: i64,
    pub total_dirs: i64,
    pub total_size: i64,
    pub avg_file_size: i64,
    pub oldest_file: Option<DateTime<Utc>>,
    pub newest_file: Option<DateTime<Utc>>,
    pub last_scan: Option<DateTime<Utc>>,
    pub largest_files: Vec<FileRecord>,
    pub recent_files: Vec<FileRecord>,
    pub top_extensions: Vec<ExtensionStats>,
    pub top_ext_by_size: Vec<ExtensionStats>,
    pub size_distribution: Vec<SizeRange>,
    pub year_distribution: Vec<YearStats>,
}

/// Roll-up over every opened index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalStats {
    pub total_files: i64,
    pub total_dirs: i64,
    pub total_size: i64,
    pub index_count: usize,
    pub top_extensions: Vec<ExtensionStats>,
    pub top_ext_by_size: Vec<ExtensionStats>,
    pub size_distribution: Vec<SizeRange>,
    pub year_distribution: Vec<YearStats>,
    pub index_stats: Vec<IndexStats>,
}

/// One entry of the scan history ring (newest first, at most 30 kept).
#[derive(Debug, Clone)]
pub struct ScanHistoryEntry {
    pub id: i64,
    pub scan_time: i64,
    pub stats: IndexStats,
}
