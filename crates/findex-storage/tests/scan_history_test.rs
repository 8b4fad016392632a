//! Scan history ring: append, prune, ordered reads.

use findex_core::models::IndexStats;
use findex_storage::connection::open_in_memory;
use findex_storage::queries::scan_history;

fn stats(total_files: i64) -> IndexStats {
    IndexStats {
        name: "test".to_string(),
        total_files,
        ..IndexStats::default()
    }
}

#[test]
fn append_and_read_back() {
    let conn = open_in_memory().unwrap();
    scan_history::append(&conn, 1_700_000_000, &stats(42)).unwrap();

    let entries = scan_history::recent(&conn, 10).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].scan_time, 1_700_000_000);
    assert_eq!(entries[0].stats.total_files, 42);
    assert_eq!(entries[0].stats.name, "test");
}

#[test]
fn newest_first() {
    let conn = open_in_memory().unwrap();
    scan_history::append(&conn, 1_700_000_000, &stats(1)).unwrap();
    scan_history::append(&conn, 1_700_000_100, &stats(2)).unwrap();
    scan_history::append(&conn, 1_700_000_200, &stats(3)).unwrap();

    let entries = scan_history::recent(&conn, 2).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].stats.total_files, 3);
    assert_eq!(entries[1].stats.total_files, 2);
}

#[test]
fn ring_prunes_beyond_thirty() {
    let conn = open_in_memory().unwrap();
    for i in 0..40 {
        scan_history::append(&conn, 1_700_000_000 + i, &stats(i)).unwrap();
    }

    assert_eq!(scan_history::count(&conn).unwrap(), 30);

    // The survivors are the newest 30 snapshots.
    let entries = scan_history::recent(&conn, 30).unwrap();
    assert_eq!(entries[0].stats.total_files, 39);
    assert_eq!(entries[29].stats.total_files, 10);
}
