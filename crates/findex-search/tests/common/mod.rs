//! Shared fixtures: seeded on-disk index stores.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use findex_core::config::IndexConfig;
use findex_core::models::FileRecord;
use findex_core::paths;
use findex_search::Searcher;

pub const NOW: i64 = 1_700_000_000;
pub const DAY: i64 = 86_400;
pub const KIB: i64 = 1024;
pub const MIB: i64 = 1024 * 1024;

pub fn rec(
    index: &str,
    root: &str,
    path: &str,
    size: i64,
    mod_time: i64,
    is_dir: bool,
) -> FileRecord {
    let name = path.rsplit('/').next().unwrap().to_string();
    FileRecord {
        id: 0,
        index_name: index.to_string(),
        path: path.to_string(),
        name: name.clone(),
        dir: root.to_string(),
        dir_index: paths::dir_index(path),
        ext: if is_dir { String::new() } else { paths::file_ext(&name) },
        size,
        mod_time,
        is_dir,
    }
}

/// The seed dataset: three directories under `/data`, five files.
pub fn media_dataset(index: &str) -> Vec<FileRecord> {
    vec![
        rec(index, "/data", "/data/documents", 0, NOW, true),
        rec(index, "/data", "/data/images", 0, NOW, true),
        rec(index, "/data", "/data/videos", 0, NOW, true),
        rec(index, "/data", "/data/documents/report.pdf", MIB, NOW - 30 * DAY, false),
        rec(index, "/data", "/data/documents/notes.txt", 512, NOW - 7 * DAY, false),
        rec(index, "/data", "/data/images/photo.jpg", 5 * MIB, NOW - 365 * DAY, false),
        rec(index, "/data", "/data/images/screenshot.png", 2 * MIB, NOW, false),
        rec(index, "/data", "/data/videos/movie.mp4", 500 * MIB, NOW - 180 * DAY, false),
    ]
}

/// Build a finalized store at `db_path` holding `records`.
pub fn seed_store(db_path: &Path, records: &[FileRecord]) {
    let conn = findex_storage::connection::open_store(db_path).unwrap();
    findex_storage::queries::files::upsert_batch(&conn, records).unwrap();
    findex_storage::queries::files::finalize(&conn).unwrap();
}

pub fn index_config(name: &str, db_path: &Path) -> IndexConfig {
    IndexConfig {
        name: name.to_string(),
        db_path: db_path.to_path_buf(),
        ..IndexConfig::default()
    }
}

/// Seed one `media` index in `dir` and open a searcher over it.
pub fn media_searcher(dir: &Path) -> (Searcher, PathBuf) {
    let db_path = dir.join("media.db");
    seed_store(&db_path, &media_dataset("media"));
    let searcher = Searcher::open(&[index_config("media", &db_path)]).unwrap();
    (searcher, db_path)
}

pub fn names(records: &[FileRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}
