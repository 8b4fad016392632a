//! ZIP descent: synthetic directories, member records, opt-out.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use findex_core::config::IndexConfig;
use findex_scan::coordinator::scan_index;
use findex_storage::connection;
use findex_storage::queries::files;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn write_archive(path: &Path) {
    let mut zw = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    zw.start_file("readme.txt", options).unwrap();
    zw.write_all(b"hello").unwrap();
    zw.start_file("docs/guide.md", options).unwrap();
    zw.write_all(b"0123456789").unwrap();
    zw.start_file("docs/img/logo.png", options).unwrap();
    zw.write_all(&[0u8; 64]).unwrap();
    zw.finish().unwrap();
}

fn index_config(dir: &Path, scan_zips: bool) -> IndexConfig {
    IndexConfig {
        name: "zips".to_string(),
        db_path: dir.join("data").join("zips.db"),
        root_paths: vec![dir.join("tree").display().to_string()],
        scan_zip_contents: scan_zips,
        scan_workers: 2,
        ..IndexConfig::default()
    }
}

fn setup_tree(dir: &Path) -> String {
    let tree = dir.join("tree");
    fs::create_dir_all(&tree).unwrap();
    write_archive(&tree.join("bundle.zip"));
    fs::write(tree.join("plain.txt"), b"xy").unwrap();
    tree.display().to_string()
}

#[test]
fn archive_members_become_records() {
    let dir = tempfile::tempdir().unwrap();
    let tree = setup_tree(dir.path());
    let idx = index_config(dir.path(), true);

    scan_index(&idx, false).unwrap();

    let conn = connection::open_store(&idx.db_path).unwrap();
    let mut paths: Vec<String> = {
        let mut stmt = conn.prepare("SELECT path FROM files ORDER BY path").unwrap();
        let rows = stmt.query_map([], |r| r.get(0)).unwrap();
        rows.collect::<Result<_, _>>().unwrap()
    };
    paths.sort();

    let zip_path = format!("{tree}/bundle.zip");
    for expected in [
        zip_path.clone(),
        format!("{zip_path}!"),
        format!("{zip_path}!/readme.txt"),
        format!("{zip_path}!/docs"),
        format!("{zip_path}!/docs/guide.md"),
        format!("{zip_path}!/docs/img"),
        format!("{zip_path}!/docs/img/logo.png"),
        format!("{tree}/plain.txt"),
    ] {
        assert!(paths.contains(&expected), "missing {expected}");
    }
}

#[test]
fn member_sizes_are_uncompressed() {
    let dir = tempfile::tempdir().unwrap();
    let tree = setup_tree(dir.path());
    let idx = index_config(dir.path(), true);

    scan_index(&idx, false).unwrap();

    let conn = connection::open_store(&idx.db_path).unwrap();
    let zip_path = format!("{tree}/bundle.zip");

    let size: i64 = conn
        .query_row(
            "SELECT size FROM files WHERE path = ?1",
            [format!("{zip_path}!/docs/img/logo.png")],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(size, 64);

    // Synthetic directories weigh nothing and carry no extension.
    let (dir_size, dir_ext, is_dir): (i64, String, bool) = conn
        .query_row(
            "SELECT size, ext, is_dir FROM files WHERE path = ?1",
            [format!("{zip_path}!/docs")],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(dir_size, 0);
    assert_eq!(dir_ext, "");
    assert!(is_dir);
}

#[test]
fn synthetic_root_is_named_after_the_archive() {
    let dir = tempfile::tempdir().unwrap();
    let tree = setup_tree(dir.path());
    let idx = index_config(dir.path(), true);

    scan_index(&idx, false).unwrap();

    let conn = connection::open_store(&idx.db_path).unwrap();
    let name: String = conn
        .query_row(
            "SELECT name FROM files WHERE path = ?1",
            [format!("{tree}/bundle.zip!")],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(name, "bundle.zip!");
}

#[test]
fn members_are_browsable_by_dir_index() {
    let dir = tempfile::tempdir().unwrap();
    let tree = setup_tree(dir.path());
    let idx = index_config(dir.path(), true);

    scan_index(&idx, false).unwrap();

    let conn = connection::open_store(&idx.db_path).unwrap();
    let docs = format!("{tree}/bundle.zip!/docs");
    let children = files::children(
        &conn,
        findex_core::paths::dir_index_of(&docs),
        &docs,
    )
    .unwrap();
    let names: Vec<&str> = children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["img", "guide.md"]);
}

#[test]
fn descent_disabled_leaves_only_the_archive() {
    let dir = tempfile::tempdir().unwrap();
    setup_tree(dir.path());
    let idx = index_config(dir.path(), false);

    scan_index(&idx, false).unwrap();

    let conn = connection::open_store(&idx.db_path).unwrap();
    let inner: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM files WHERE path LIKE '%!/%' OR path LIKE '%!'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(inner, 0);
    assert_eq!(files::count_files(&conn).unwrap(), 2);
}

#[test]
fn corrupt_archive_is_logged_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let tree = dir.path().join("tree");
    fs::create_dir_all(&tree).unwrap();
    fs::write(tree.join("broken.zip"), b"this is not a zip archive").unwrap();
    fs::write(tree.join("ok.txt"), b"fine").unwrap();
    let idx = index_config(dir.path(), true);

    scan_index(&idx, false).unwrap();

    let conn = connection::open_store(&idx.db_path).unwrap();
    // The archive file itself is indexed; nothing under it is.
    assert_eq!(files::count_files(&conn).unwrap(), 2);
    let inner: i64 = conn
        .query_row("SELECT COUNT(*) FROM files WHERE path LIKE '%!/%'", [], |r| {
            r.get(0)
        })
        .unwrap();
    assert_eq!(inner, 0);
}
