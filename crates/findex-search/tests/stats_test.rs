//! Live per-index stats, the global roll-up, and scan history reads.

mod common;

use common::*;
use findex_search::Searcher;

#[test]
fn index_stats_live_read() {
    let dir = tempfile::tempdir().unwrap();
    let (searcher, _) = media_searcher(dir.path());

    let stats = searcher.index_stats("media").unwrap();
    assert_eq!(stats.name, "media");
    assert_eq!(stats.total_files, 5);
    assert_eq!(stats.total_dirs, 3);
    assert_eq!(stats.total_size, 508 * MIB + 512);
    assert_eq!(stats.largest_files[0].name, "movie.mp4");
    assert_eq!(stats.size_distribution.len(), 7);
}

#[test]
fn global_stats_sum_across_indexes() {
    let dir = tempfile::tempdir().unwrap();
    let a_path = dir.path().join("a.db");
    let b_path = dir.path().join("b.db");
    seed_store(&a_path, &media_dataset("a"));
    seed_store(
        &b_path,
        &[
            rec("b", "/other", "/other/one.pdf", 100, NOW, false),
            rec("b", "/other", "/other/two.jpg", 200, NOW, false),
            rec("b", "/other", "/other/sub", 0, NOW, true),
        ],
    );

    let searcher = Searcher::open(&[
        index_config("a", &a_path),
        index_config("b", &b_path),
    ])
    .unwrap();

    let global = searcher.global_stats().unwrap();
    assert_eq!(global.index_count, 2);
    assert_eq!(global.total_files, 7);
    assert_eq!(global.total_dirs, 4);
    assert_eq!(global.total_size, 508 * MIB + 512 + 300);
    assert_eq!(global.index_stats.len(), 2);

    // Extensions merge by name across indexes.
    let pdf = global
        .top_extensions
        .iter()
        .find(|e| e.extension == ".pdf")
        .unwrap();
    assert_eq!(pdf.count, 2);
    assert_eq!(pdf.size, MIB + 100);

    // The histogram keeps its fixed bucket order after summation.
    let labels: Vec<&str> = global
        .size_distribution
        .iter()
        .map(|b| b.label.as_str())
        .collect();
    assert_eq!(labels[0], "< 1 KB");
    assert_eq!(labels[6], "> 1 GB");
    assert_eq!(global.size_distribution[0].count, 3);

    // Years sort descending after merging.
    let years: Vec<i32> = global.year_distribution.iter().map(|y| y.year).collect();
    let mut sorted = years.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(years, sorted);
}

#[test]
fn global_stats_on_empty_searcher() {
    let searcher = Searcher::open(&[]).unwrap();
    let global = searcher.global_stats().unwrap();
    assert_eq!(global.index_count, 0);
    assert_eq!(global.total_files, 0);
    assert!(global.index_stats.is_empty());
}

#[test]
fn cached_stats_come_from_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let (searcher, db_path) = media_searcher(dir.path());

    // Nothing cached until a scan snapshots its stats.
    assert!(searcher.cached_index_stats("media").unwrap().is_none());

    let snapshot = findex_core::models::IndexStats {
        name: "media".to_string(),
        total_files: 123,
        ..findex_core::models::IndexStats::default()
    };
    let conn = findex_storage::connection::open_store(&db_path).unwrap();
    findex_storage::queries::metadata::set(
        &conn,
        findex_storage::queries::metadata::KEY_STATS_CACHE,
        &serde_json::to_string(&snapshot).unwrap(),
    )
    .unwrap();
    drop(conn);

    let cached = searcher.cached_index_stats("media").unwrap().unwrap();
    assert_eq!(cached.total_files, 123);
}

#[test]
fn scan_history_reads_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let (searcher, db_path) = media_searcher(dir.path());

    let conn = findex_storage::connection::open_store(&db_path).unwrap();
    for i in 0..3 {
        let stats = findex_core::models::IndexStats {
            name: "media".to_string(),
            total_files: i,
            ..findex_core::models::IndexStats::default()
        };
        findex_storage::queries::scan_history::append(&conn, NOW + i, &stats).unwrap();
    }
    drop(conn);

    let history = searcher.scan_history("media", 2).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].stats.total_files, 2);
    assert_eq!(history[1].stats.total_files, 1);
}
