//! Per-scan logging to stdout and a gzip-compressed file.
//!
//! One `ScanLogger` observes one scan: thread-safe counters fed by the
//! walker, plus a timestamped message log written atomically to both
//! standard output and `<index>_scan_<timestamp>.log.gz` next to the
//! index store. Old logs of the same index are swept by mtime on startup.

use std::fmt::Display;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use chrono::{DateTime, Local, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Thread-safe observer of one scan.
pub struct ScanLogger {
    index_name: String,
    log_path: Option<PathBuf>,
    file: Mutex<Option<GzEncoder<File>>>,
    started: Instant,

    files_scanned: AtomicI64,
    dirs_scanned: AtomicI64,
    files_excluded: AtomicI64,
    dirs_excluded: AtomicI64,
    errors: AtomicI64,
    zip_files_scanned: AtomicI64,
    zip_entries_found: AtomicI64,
}

impl ScanLogger {
    /// Create a logger for one scan of `index_name`, writing its log file
    /// next to `db_path`. When the file cannot be created the logger still
    /// works with stdout only. `retention_days = 0` keeps old logs forever.
    pub fn create(db_path: &Path, index_name: &str, retention_days: u32) -> Self {
        let dir = db_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        if retention_days > 0 {
            cleanup_old_logs(&dir, index_name, retention_days);
        }

        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
        let log_path = dir.join(format!("{index_name}_scan_{timestamp}.log.gz"));
        let file = match File::create(&log_path) {
            Ok(f) => Some(GzEncoder::new(f, Compression::default())),
            Err(err) => {
                tracing::warn!(
                    path = %log_path.display(),
                    error = %err,
                    "cannot create scan log file, logging to stdout only"
                );
                None
            }
        };
        let has_file = file.is_some();

        let logger = Self {
            index_name: index_name.to_string(),
            log_path: has_file.then_some(log_path.clone()),
            file: Mutex::new(file),
            started: Instant::now(),
            files_scanned: AtomicI64::new(0),
            dirs_scanned: AtomicI64::new(0),
            files_excluded: AtomicI64::new(0),
            dirs_excluded: AtomicI64::new(0),
            errors: AtomicI64::new(0),
            zip_files_scanned: AtomicI64::new(0),
            zip_entries_found: AtomicI64::new(0),
        };

        logger.log(&"=".repeat(80));
        logger.log("SCAN LOG STARTED");
        logger.log(&format!("Index: {index_name}"));
        logger.log(&format!("Database path: {}", db_path.display()));
        if has_file {
            logger.log(&format!("Log file: {}", log_path.display()));
        }
        logger.log(&format!("Log retention: {retention_days} days"));
        logger.log(&format!("Start time: {}", Local::now().to_rfc3339()));
        logger.log(&"=".repeat(80));

        logger
    }

    /// Write one timestamped line to stdout and the gzip file.
    pub fn log(&self, msg: &str) {
        let line = format!("{} {msg}", Local::now().format("%Y/%m/%d %H:%M:%S"));
        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        println!("{line}");
        if let Some(gz) = guard.as_mut() {
            let _ = writeln!(gz, "{line}");
        }
    }

    /// Write a section header.
    pub fn section(&self, title: &str) {
        self.log("");
        self.log(&format!("----- {title} -----"));
    }

    /// Log the scan configuration.
    pub fn log_config(
        &self,
        root_paths: &[String],
        exclude_paths: &[String],
        workers: usize,
        scan_zip_contents: bool,
    ) {
        self.section("SCAN CONFIGURATION");
        self.log(&format!("Root paths ({}):", root_paths.len()));
        for (i, p) in root_paths.iter().enumerate() {
            self.log(&format!("  [{}] {p}", i + 1));
        }
        self.log(&format!("Exclude patterns ({}):", exclude_paths.len()));
        for (i, p) in exclude_paths.iter().enumerate() {
            self.log(&format!("  [{}] {p}", i + 1));
        }
        self.log(&format!("Number of workers: {workers}"));
        self.log(&format!("Scan zip contents: {scan_zip_contents}"));
    }

    /// Log the state left behind by the previous scan.
    pub fn log_previous(
        &self,
        total_files: i64,
        total_dirs: i64,
        last_scan: Option<DateTime<Utc>>,
    ) {
        self.section("PREVIOUS SCAN STATE");
        match last_scan {
            Some(t) => {
                let hours = (Utc::now() - t).num_minutes() as f64 / 60.0;
                self.log(&format!("Last scan: {} ({hours:.1} hours ago)", t.to_rfc3339()));
            }
            None => self.log("Last scan: never (first scan)"),
        }
        self.log(&format!("Previous file count: {total_files}"));
        self.log(&format!("Previous directory count: {total_dirs}"));
    }

    /// Log the start of one root's walk.
    pub fn root_scan_start(&self, root_index: usize, total_roots: usize, root_path: &str) {
        self.section(&format!("SCANNING ROOT {root_index}/{total_roots}"));
        self.log(&format!("Path: {root_path}"));
        match std::fs::metadata(root_path) {
            Ok(meta) => self.log(&format!("Root is directory: {}", meta.is_dir())),
            Err(err) => self.log(&format!("WARNING: cannot access root path: {err}")),
        }
    }

    /// Log the completion of one root's walk.
    pub fn root_scan_complete(
        &self,
        root_index: usize,
        total_roots: usize,
        root_path: &str,
        duration: std::time::Duration,
        files_found: i64,
        dirs_found: i64,
    ) {
        self.log(&format!("Root {root_index}/{total_roots} completed: {root_path}"));
        self.log(&format!("  Duration: {duration:?}"));
        self.log(&format!("  Files found in this root: {files_found}"));
        self.log(&format!("  Directories found in this root: {dirs_found}"));
    }

    /// Record an excluded directory.
    pub fn excluded_dir(&self, path: &str, pattern: &str) {
        self.dirs_excluded.fetch_add(1, Ordering::Relaxed);
        self.log(&format!("EXCLUDED DIR: {path} (pattern: {pattern})"));
    }

    /// Record an excluded file.
    pub fn excluded_file(&self, path: &str, pattern: &str) {
        self.files_excluded.fetch_add(1, Ordering::Relaxed);
        self.log(&format!("EXCLUDED FILE: {path} (pattern: {pattern})"));
    }

    /// Record a per-entry error. Never aborts the scan.
    pub fn error(&self, context: &str, path: &str, err: &dyn Display) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        self.log(&format!("ERROR [{context}]: {path} - {err}"));
    }

    /// Record a scanned ZIP archive and its entry count.
    pub fn zip_scanned(&self, path: &str, entries: usize) {
        self.zip_files_scanned.fetch_add(1, Ordering::Relaxed);
        self.zip_entries_found
            .fetch_add(entries as i64, Ordering::Relaxed);
        self.log(&format!("ZIP SCANNED: {path} ({entries} entries)"));
    }

    pub fn inc_files(&self) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dirs(&self) {
        self.dirs_scanned.fetch_add(1, Ordering::Relaxed);
    }

    /// Log batch insertion progress.
    pub fn batch_insert(&self, batch_size: usize, total_processed: usize) {
        self.log(&format!(
            "BATCH INSERT: {batch_size} records (total processed: {total_processed})"
        ));
    }

    /// Log database totals after the scan.
    pub fn db_stats(&self, total_files: i64, total_dirs: i64, total_size: i64) {
        self.section("DATABASE STATISTICS AFTER SCAN");
        self.log(&format!("Total files in database: {total_files}"));
        self.log(&format!("Total directories in database: {total_dirs}"));
        self.log(&format!(
            "Total size: {total_size} bytes ({:.2} GB)",
            total_size as f64 / (1024.0 * 1024.0 * 1024.0)
        ));
    }

    /// Log previous-vs-current totals, warning on decreases.
    pub fn comparison(&self, prev_files: i64, curr_files: i64, prev_dirs: i64, curr_dirs: i64) {
        self.section("SCAN COMPARISON");
        self.log(&format!(
            "Files: {prev_files} -> {curr_files} (diff: {:+})",
            curr_files - prev_files
        ));
        self.log(&format!(
            "Directories: {prev_dirs} -> {curr_dirs} (diff: {:+})",
            curr_dirs - prev_dirs
        ));
        if curr_files < prev_files {
            self.log(&format!(
                "WARNING: file count decreased by {} - check roots, excludes, and permissions",
                prev_files - curr_files
            ));
        }
        if curr_dirs < prev_dirs {
            self.log(&format!(
                "WARNING: directory count decreased by {}",
                prev_dirs - curr_dirs
            ));
        }
    }

    /// Files and directories scanned so far (for per-root deltas).
    pub fn counts(&self) -> (i64, i64) {
        (
            self.files_scanned.load(Ordering::Relaxed),
            self.dirs_scanned.load(Ordering::Relaxed),
        )
    }

    pub fn files_excluded(&self) -> i64 {
        self.files_excluded.load(Ordering::Relaxed)
    }

    pub fn dirs_excluded(&self) -> i64 {
        self.dirs_excluded.load(Ordering::Relaxed)
    }

    pub fn errors_count(&self) -> i64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn zip_counts(&self) -> (i64, i64) {
        (
            self.zip_files_scanned.load(Ordering::Relaxed),
            self.zip_entries_found.load(Ordering::Relaxed),
        )
    }

    /// Path of the gzip log file, when one was created.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Write the summary and finish the gzip stream. Idempotent; further
    /// messages go to stdout only.
    pub fn close(&self) {
        let duration = self.started.elapsed();
        let files = self.files_scanned.load(Ordering::Relaxed);

        self.section("SCAN SUMMARY");
        self.log(&format!("Total duration: {duration:?}"));
        self.log(&format!("Files scanned: {files}"));
        self.log(&format!(
            "Directories scanned: {}",
            self.dirs_scanned.load(Ordering::Relaxed)
        ));
        self.log(&format!("Files excluded: {}", self.files_excluded()));
        self.log(&format!("Directories excluded: {}", self.dirs_excluded()));
        self.log(&format!("Errors encountered: {}", self.errors_count()));
        let (zips, zip_entries) = self.zip_counts();
        self.log(&format!("Zip files scanned: {zips}"));
        self.log(&format!("Zip entries found: {zip_entries}"));
        if files > 0 && duration.as_secs_f64() > 0.0 {
            self.log(&format!(
                "Scan rate: {:.0} files/second",
                files as f64 / duration.as_secs_f64()
            ));
        }
        self.log(&"=".repeat(80));
        self.log(&format!("SCAN COMPLETED: {}", Local::now().to_rfc3339()));
        self.log(&"=".repeat(80));

        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(gz) = guard.take() {
            match gz.finish() {
                Ok(file) => {
                    let _ = file.sync_all();
                }
                Err(err) => {
                    tracing::warn!(index = %self.index_name, error = %err, "closing scan log failed");
                }
            }
        }
    }
}

/// Remove `<index>_scan_*.log.gz` files older than `retention_days`.
fn cleanup_old_logs(dir: &Path, index_name: &str, retention_days: u32) {
    let prefix = format!("{index_name}_scan_");
    let cutoff = std::time::SystemTime::now()
        - std::time::Duration::from_secs((i64::from(retention_days) * SECONDS_PER_DAY) as u64);

    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(&prefix) || !name.ends_with(".log.gz") {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        let Ok(mtime) = meta.modified() else { continue };
        if mtime < cutoff {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => tracing::info!(log = name, "removed old scan log"),
                Err(err) => tracing::warn!(log = name, error = %err, "cannot remove old scan log"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn writes_gzipped_log_next_to_store() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("media.db");
        let logger = ScanLogger::create(&db_path, "media", 0);
        logger.log("hello from the scan");
        let log_path = logger.log_path().unwrap().to_path_buf();
        logger.close();

        let mut gz = flate2::read::GzDecoder::new(File::open(&log_path).unwrap());
        let mut contents = String::new();
        gz.read_to_string(&mut contents).unwrap();
        assert!(contents.contains("SCAN LOG STARTED"));
        assert!(contents.contains("hello from the scan"));
        assert!(contents.contains("SCAN SUMMARY"));
    }

    #[test]
    fn counters_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let logger = ScanLogger::create(&dir.path().join("x.db"), "x", 0);
        logger.inc_files();
        logger.inc_files();
        logger.inc_dirs();
        logger.excluded_file("/a", "*.bak");
        logger.error("stat", "/b", &"denied");
        logger.zip_scanned("/c.zip", 7);

        assert_eq!(logger.counts(), (2, 1));
        assert_eq!(logger.files_excluded(), 1);
        assert_eq!(logger.errors_count(), 1);
        assert_eq!(logger.zip_counts(), (1, 7));
        logger.close();
    }

    #[test]
    fn retention_removes_only_old_logs_of_same_index() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("media_scan_2001-01-01_00-00-00.log.gz");
        let other = dir.path().join("docs_scan_2001-01-01_00-00-00.log.gz");
        std::fs::write(&old, b"x").unwrap();
        std::fs::write(&other, b"x").unwrap();

        // Backdate both files well past any retention window.
        let past = std::time::SystemTime::now() - std::time::Duration::from_secs(400 * 24 * 3600);
        for p in [&old, &other] {
            let f = File::options().write(true).open(p).unwrap();
            f.set_modified(past).unwrap();
        }

        let logger = ScanLogger::create(&dir.path().join("media.db"), "media", 30);
        logger.close();

        assert!(!old.exists());
        assert!(other.exists());
    }

    #[test]
    fn zero_retention_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("media_scan_2001-01-01_00-00-00.log.gz");
        std::fs::write(&old, b"x").unwrap();
        let past = std::time::SystemTime::now() - std::time::Duration::from_secs(400 * 24 * 3600);
        let f = File::options().write(true).open(&old).unwrap();
        f.set_modified(past).unwrap();

        let logger = ScanLogger::create(&dir.path().join("media.db"), "media", 0);
        logger.close();
        assert!(old.exists());
    }
}
