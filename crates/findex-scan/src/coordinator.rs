//! Scan coordinator: one atomic rebuild per index.
//!
//! Each rebuild stages records into `<db_path>.new`, finalizes the
//! searchable rows and the FTS index there, checkpoints the WAL, then
//! renames the temp file over the live store in one step. Readers opening
//! the store at any moment observe either the prior or the new dataset,
//! never a partial one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use findex_core::cancel::CancellationToken;
use findex_core::config::{AppConfig, IndexConfig};
use findex_core::errors::{ScanError, StorageError};
use findex_core::models::FileRecord;
use findex_core::source::FileSource;
use findex_storage::queries::{files, metadata, scan_history};
use findex_storage::{connection, stats};

use crate::dir_sizes;
use crate::logger::ScanLogger;
use crate::walker::LocalSource;

/// Records buffered between batch transactions.
const BATCH_SIZE: usize = 100_000;

/// Scan every configured index. Per-index failures are logged and do not
/// stop the remaining indexes.
pub fn scan_indexes(cfg: &AppConfig, force: bool) {
    for idx in &cfg.indexes {
        if let Err(err) = scan_index(idx, force) {
            tracing::error!(index = %idx.name, error = %err, "index scan failed");
        }
    }
}

/// Rebuild one index unless its refresh interval says it is not due yet.
pub fn scan_index(idx: &IndexConfig, force: bool) -> Result<(), ScanError> {
    let db_path = std::path::absolute(&idx.db_path).map_err(|e| ScanError::Io {
        path: idx.db_path.clone(),
        source: e,
    })?;

    // Refresh guard and previous totals come from the live store.
    let (last_scan, prev_files, prev_dirs) = {
        let conn = connection::open_store(&db_path)?;
        (
            metadata::last_scan(&conn)?,
            files::count_files(&conn)?,
            files::count_dirs(&conn)?,
        )
    };

    if !force && idx.refresh_interval > 0 {
        if let Some(last) = last_scan {
            let next = last + chrono::Duration::seconds(idx.refresh_interval as i64);
            if Utc::now() < next {
                tracing::info!(
                    index = %idx.name,
                    last_scan = %last.to_rfc3339(),
                    refresh_interval = idx.refresh_interval,
                    "skipping index, not due yet"
                );
                return Ok(());
            }
        }
    }

    let logger = Arc::new(ScanLogger::create(&db_path, &idx.name, idx.log_retention_days));
    if force {
        logger.log("FORCE SCAN: refresh interval ignored");
    }

    let source = match idx.source_engine.as_str() {
        "local" => LocalSource::new(
            &idx.name,
            &idx.root_paths,
            &idx.exclude_paths,
            idx.scan_workers,
            idx.scan_zip_contents,
            Arc::clone(&logger),
            CancellationToken::new(),
        ),
        other => {
            logger.log(&format!(
                "Skipping unsupported source_engine {other} for index {}",
                idx.name
            ));
            logger.close();
            tracing::warn!(index = %idx.name, source_engine = other, "unsupported source engine");
            return Ok(());
        }
    };

    logger.log_config(
        &idx.root_paths,
        &idx.exclude_paths,
        source.workers(),
        idx.scan_zip_contents,
    );
    logger.log_previous(prev_files, prev_dirs, last_scan);
    tracing::info!(
        index = %idx.name,
        engine = source.name(),
        scan_zip_contents = idx.scan_zip_contents,
        "scanning index"
    );

    // A leftover temp store marks a scan that crashed mid-build.
    let temp_path = temp_store_path(&db_path);
    remove_temp_files(&temp_path);

    match build_index(idx, &source, &temp_path, &logger) {
        Ok((curr_files, curr_dirs, curr_size)) => {
            logger.db_stats(curr_files, curr_dirs, curr_size);
            logger.comparison(prev_files, curr_files, prev_dirs, curr_dirs);

            logger.log("Swapping database...");
            if let Err(err) = std::fs::rename(&temp_path, &db_path) {
                remove_temp_files(&temp_path);
                logger.error("db_swap", &db_path.display().to_string(), &err);
                logger.close();
                return Err(ScanError::Io {
                    path: db_path,
                    source: err,
                });
            }
            remove_side_files(&temp_path);

            logger.log("Index scan completed and swapped atomically");
            logger.close();

            let bg_path = db_path.clone();
            let bg_index = idx.name.clone();
            std::thread::spawn(move || {
                if let Err(err) = dir_sizes::calculate(&bg_path, &bg_index) {
                    tracing::warn!(
                        index = %bg_index,
                        error = %err,
                        "background directory size calculation failed"
                    );
                }
            });
            Ok(())
        }
        Err(err) => {
            remove_temp_files(&temp_path);
            logger.error("scan", &idx.name, &err);
            logger.close();
            Err(err)
        }
    }
}

/// Stage, finalize, and checkpoint the new dataset in the temp store.
/// Returns the post-finalize `(files, dirs, total_size)` totals.
fn build_index(
    idx: &IndexConfig,
    source: &dyn FileSource,
    temp_path: &Path,
    logger: &ScanLogger,
) -> Result<(i64, i64, i64), ScanError> {
    let conn = connection::open_store(temp_path)?;
    files::reset_searchable(&conn)?;

    logger.section("FILE SCANNING");
    let mut batch: Vec<FileRecord> = Vec::new();
    let mut total = 0usize;
    for record in source.walk().iter() {
        batch.push(record);
        total += 1;
        if batch.len() >= BATCH_SIZE {
            logger.batch_insert(batch.len(), total);
            files::upsert_batch(&conn, &batch)?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        logger.batch_insert(batch.len(), total);
        files::upsert_batch(&conn, &batch)?;
    }
    logger.log(&format!("Scanning completed, {total} records from source"));

    logger.log("Finalizing index...");
    files::finalize(&conn)?;

    let now = Utc::now();
    let mut index_stats = stats::compute_index_stats(&conn, &idx.name)?;
    index_stats.last_scan = Some(now);
    let stats_json =
        serde_json::to_string(&index_stats).map_err(|e| StorageError::Decode {
            message: e.to_string(),
        })?;
    metadata::set(&conn, metadata::KEY_STATS_CACHE, &stats_json)?;
    scan_history::append(&conn, now.timestamp(), &index_stats)?;
    metadata::set_last_scan(&conn, now)?;

    logger.log("Checkpointing WAL...");
    connection::checkpoint_truncate(&conn)?;

    let curr_files = files::count_files(&conn)?;
    let curr_dirs = files::count_dirs(&conn)?;
    let curr_size = files::total_size(&conn)?;
    drop(conn);

    Ok((curr_files, curr_dirs, curr_size))
}

/// `<db_path>.new`, the staging store of one rebuild.
pub fn temp_store_path(db_path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.new", db_path.display()))
}

fn side_file(path: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{suffix}", path.display()))
}

/// Remove the temp store and its journal side files.
pub fn remove_temp_files(temp_path: &Path) {
    let _ = std::fs::remove_file(temp_path);
    remove_side_files(temp_path);
}

fn remove_side_files(temp_path: &Path) {
    for suffix in ["-wal", "-shm"] {
        let _ = std::fs::remove_file(side_file(temp_path, suffix));
    }
}
