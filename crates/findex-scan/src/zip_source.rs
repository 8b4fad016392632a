//! ZIP archive descent.
//!
//! An archive appears in the index as a synthetic directory tree rooted at
//! `"<archive-path>!"`; member paths use the `"<archive-path>!/<inner>"`
//! convention. Only headers are read, entry bodies stay compressed, and
//! nested archives are not descended into.

use std::collections::HashSet;
use std::fs::File;

use crossbeam_channel::Sender;
use zip::ZipArchive;

use findex_core::models::FileRecord;
use findex_core::paths;

use crate::walker::WalkContext;

/// Emit records for the contents of one archive. Unreadable archives are
/// logged and skipped; the surrounding walk continues.
pub(crate) fn scan_archive(
    ctx: &WalkContext,
    zip_path: &str,
    root: &str,
    records: &Sender<FileRecord>,
) {
    let file = match File::open(zip_path) {
        Ok(f) => f,
        Err(err) => {
            ctx.logger.error("open_zip", zip_path, &err);
            return;
        }
    };
    let mut archive = match ZipArchive::new(file) {
        Ok(a) => a,
        Err(err) => {
            ctx.logger.error("open_zip", zip_path, &err);
            return;
        }
    };
    ctx.logger.zip_scanned(zip_path, archive.len());

    let mut seen = HashSet::new();

    // Synthetic root for the archive's contents: /path/to/archive.zip!
    let zip_root = format!("{zip_path}!");
    let base_name = zip_path.rsplit('/').next().unwrap_or(zip_path);
    if !emit_dir(ctx, root, &zip_root, &format!("{base_name}!"), 0, records) {
        return;
    }
    seen.insert(zip_root);

    for i in 0..archive.len() {
        let entry = match archive.by_index(i) {
            Ok(e) => e,
            Err(err) => {
                ctx.logger.error("zip_entry", zip_path, &err);
                continue;
            }
        };

        let rel = entry.name().trim_end_matches('/');
        if rel.is_empty() {
            continue;
        }
        let base = rel.rsplit('/').next().unwrap_or("");
        if base.is_empty() || base == "." {
            continue;
        }

        // Archives list members in no particular order, so materialize
        // every ancestor directory before the member itself.
        if let Some(idx) = rel.rfind('/') {
            if !emit_ancestors(ctx, zip_path, root, &rel[..idx], &mut seen, records) {
                return;
            }
        }

        let full = format!("{zip_path}!/{rel}");
        let mod_time = header_mtime(&entry);

        if entry.is_dir() {
            if seen.insert(full.clone()) && !emit_dir(ctx, root, &full, base, mod_time, records) {
                return;
            }
            continue;
        }

        let record = FileRecord {
            id: 0,
            index_name: ctx.index_name.clone(),
            path: full.clone(),
            name: base.to_string(),
            dir: root.to_string(),
            dir_index: paths::dir_index(&full),
            ext: paths::file_ext(base),
            size: entry.size() as i64,
            mod_time,
            is_dir: false,
        };
        if records.send(record).is_err() {
            return;
        }
    }
}

/// Emit the chain of synthetic directories leading to `rel_dir`,
/// skipping those already seen in this archive.
fn emit_ancestors(
    ctx: &WalkContext,
    zip_path: &str,
    root: &str,
    rel_dir: &str,
    seen: &mut HashSet<String>,
    records: &Sender<FileRecord>,
) -> bool {
    let mut current = String::new();
    for part in rel_dir.split('/').filter(|p| !p.is_empty()) {
        if current.is_empty() {
            current.push_str(part);
        } else {
            current.push('/');
            current.push_str(part);
        }
        let full = format!("{zip_path}!/{current}");
        if !seen.insert(full.clone()) {
            continue;
        }
        if !emit_dir(ctx, root, &full, part, 0, records) {
            return false;
        }
    }
    true
}

fn emit_dir(
    ctx: &WalkContext,
    root: &str,
    path: &str,
    name: &str,
    mod_time: i64,
    records: &Sender<FileRecord>,
) -> bool {
    records
        .send(FileRecord {
            id: 0,
            index_name: ctx.index_name.clone(),
            path: path.to_string(),
            name: name.to_string(),
            dir: root.to_string(),
            dir_index: paths::dir_index(path),
            ext: String::new(),
            size: 0,
            mod_time,
            is_dir: true,
        })
        .is_ok()
}

/// Modification time from the entry's local header, 0 when absent or
/// out of range.
fn header_mtime(entry: &zip::read::ZipFile<'_>) -> i64 {
    let Some(dt) = entry.last_modified() else {
        return 0;
    };
    chrono::NaiveDate::from_ymd_opt(i32::from(dt.year()), u32::from(dt.month()), u32::from(dt.day()))
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(dt.hour()),
                u32::from(dt.minute()),
                u32::from(dt.second()),
            )
        })
        .map_or(0, |ndt| ndt.and_utc().timestamp())
}
