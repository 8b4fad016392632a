//! Parallel multi-root directory walker.
//!
//! Roots are walked one after another so the record stream never
//! interleaves entries of different roots; inside one root a fixed worker
//! pool drains a bounded queue of pending directories. When the queue is
//! full a worker descends into the subdirectory on its own stack instead
//! of blocking, so a directory with more children than the queue holds
//! can never deadlock the pool.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use globset::GlobBuilder;

use findex_core::cancel::CancellationToken;
use findex_core::models::FileRecord;
use findex_core::paths;
use findex_core::source::FileSource;

use crate::logger::ScanLogger;
use crate::zip_source;

/// Capacity of the record channel between the walker and the coordinator.
const RECORD_CHANNEL_CAPACITY: usize = 50_000;
/// Capacity of the per-root directory work queue.
const DIR_QUEUE_CAPACITY: usize = 100_000;
/// How long an idle worker waits before re-checking the active counter.
const WORKER_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// One exclusion pattern: tried as a shell-style glob against the full
/// path first, then as a plain string prefix.
#[derive(Clone)]
struct ExcludePattern {
    raw: String,
    glob: Option<globset::GlobMatcher>,
}

#[derive(Clone, Default)]
struct ExcludeSet {
    patterns: Vec<ExcludePattern>,
}

impl ExcludeSet {
    fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| ExcludePattern {
                raw: p.clone(),
                glob: GlobBuilder::new(p)
                    .literal_separator(true)
                    .build()
                    .ok()
                    .map(|g| g.compile_matcher()),
            })
            .collect();
        Self { patterns }
    }

    /// First pattern suppressing `path`, if any.
    fn matched(&self, path: &str) -> Option<&str> {
        for p in &self.patterns {
            if let Some(glob) = &p.glob {
                if glob.is_match(path) {
                    return Some(&p.raw);
                }
            }
            if path.starts_with(&p.raw) {
                return Some(&p.raw);
            }
        }
        None
    }
}

/// Everything a walk needs, cloneable into the producer thread.
#[derive(Clone)]
pub(crate) struct WalkContext {
    pub(crate) index_name: String,
    roots: Vec<String>,
    excludes: ExcludeSet,
    workers: usize,
    scan_zips: bool,
    queue_capacity: usize,
    pub(crate) logger: Arc<ScanLogger>,
    cancel: CancellationToken,
}

/// Local filesystem source: walks the configured roots and emits one
/// record per entry, optionally descending into ZIP archives.
pub struct LocalSource {
    ctx: WalkContext,
}

impl LocalSource {
    pub fn new(
        index_name: &str,
        root_paths: &[String],
        exclude_paths: &[String],
        workers: usize,
        scan_zip_contents: bool,
        logger: Arc<ScanLogger>,
        cancel: CancellationToken,
    ) -> Self {
        let workers = if workers == 0 {
            default_workers()
        } else {
            workers
        };
        Self {
            ctx: WalkContext {
                index_name: index_name.to_string(),
                roots: root_paths.to_vec(),
                excludes: ExcludeSet::new(exclude_paths),
                workers,
                scan_zips: scan_zip_contents,
                queue_capacity: DIR_QUEUE_CAPACITY,
                logger,
                cancel,
            },
        }
    }

    /// Effective worker count after defaulting.
    pub fn workers(&self) -> usize {
        self.ctx.workers
    }
}

impl FileSource for LocalSource {
    fn name(&self) -> &'static str {
        "local"
    }

    fn walk(&self) -> Receiver<FileRecord> {
        walk_with(self.ctx.clone())
    }
}

fn default_workers() -> usize {
    2 * std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Spawn the producer thread: roots sequentially, one worker pool per root.
fn walk_with(ctx: WalkContext) -> Receiver<FileRecord> {
    let (tx, rx) = bounded(RECORD_CHANNEL_CAPACITY);

    std::thread::spawn(move || {
        let total = ctx.roots.len();
        for (i, root) in ctx.roots.clone().into_iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                break;
            }
            let clean_root = paths::clean(&root);
            ctx.logger.root_scan_start(i + 1, total, &clean_root);
            let (files_before, dirs_before) = ctx.logger.counts();
            let started = Instant::now();

            walk_root(&ctx, &clean_root, &tx);

            let (files_after, dirs_after) = ctx.logger.counts();
            ctx.logger.root_scan_complete(
                i + 1,
                total,
                &clean_root,
                started.elapsed(),
                files_after - files_before,
                dirs_after - dirs_before,
            );
        }
        // Dropping the sender closes the record channel.
    });

    rx
}

/// Walk one root to completion with a fixed worker pool.
fn walk_root(ctx: &WalkContext, root: &str, records: &Sender<FileRecord>) {
    let (dir_tx, dir_rx) = bounded::<String>(ctx.queue_capacity);
    let active = AtomicI64::new(1);

    if dir_tx.send(root.to_string()).is_err() {
        return;
    }

    std::thread::scope(|scope| {
        for _ in 0..ctx.workers.max(1) {
            scope.spawn(|| dir_worker(ctx, root, &dir_tx, &dir_rx, records, &active));
        }
    });
}

/// Worker loop: pop directories until none are queued and none are being
/// processed by any worker.
fn dir_worker(
    ctx: &WalkContext,
    root: &str,
    dir_tx: &Sender<String>,
    dir_rx: &Receiver<String>,
    records: &Sender<FileRecord>,
    active: &AtomicI64,
) {
    loop {
        match dir_rx.recv_timeout(WORKER_POLL_INTERVAL) {
            Ok(dir) => {
                process_directory(ctx, root, &dir, dir_tx, records, active);
                active.fetch_sub(1, Ordering::SeqCst);
            }
            Err(RecvTimeoutError::Timeout) => {
                if active.load(Ordering::SeqCst) == 0 {
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// List one directory, emit a record per entry, queue subdirectories.
fn process_directory(
    ctx: &WalkContext,
    root: &str,
    dir: &str,
    dir_tx: &Sender<String>,
    records: &Sender<FileRecord>,
    active: &AtomicI64,
) {
    if ctx.cancel.is_cancelled() {
        return;
    }

    if let Some(pattern) = ctx.excludes.matched(dir) {
        ctx.logger.excluded_dir(dir, pattern);
        return;
    }

    let entries = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(err) => {
            ctx.logger.error("read_dir", dir, &err);
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                ctx.logger.error("read_dir", dir, &err);
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = paths::join(dir, &name);

        if let Some(pattern) = ctx.excludes.matched(&path) {
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => ctx.logger.excluded_dir(&path, pattern),
                _ => ctx.logger.excluded_file(&path, pattern),
            }
            continue;
        }

        // Does not follow symlinks: a link to a directory is recorded as a
        // plain entry and never descended into.
        let meta = match entry.metadata() {
            Ok(m) => m,
            Err(err) => {
                ctx.logger.error("stat", &path, &err);
                continue;
            }
        };
        let is_dir = meta.is_dir();

        if is_dir {
            active.fetch_add(1, Ordering::SeqCst);
            match dir_tx.try_send(path.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(p)) => {
                    // Queue full: descend on this thread instead of blocking,
                    // which would deadlock once every worker waits on the
                    // same full queue.
                    active.fetch_sub(1, Ordering::SeqCst);
                    process_directory(ctx, root, &p, dir_tx, records, active);
                }
                Err(TrySendError::Disconnected(_)) => {
                    active.fetch_sub(1, Ordering::SeqCst);
                }
            }
        }

        if is_dir {
            ctx.logger.inc_dirs();
        } else {
            ctx.logger.inc_files();
        }

        let record = FileRecord {
            id: 0,
            index_name: ctx.index_name.clone(),
            path: path.clone(),
            name: name.clone(),
            dir: root.to_string(),
            dir_index: paths::dir_index(&path),
            ext: if is_dir {
                String::new()
            } else {
                paths::file_ext(&name)
            },
            size: if is_dir { 0 } else { meta.len() as i64 },
            mod_time: unix_mtime(&meta),
            is_dir,
        };
        if records.send(record).is_err() {
            return;
        }

        if ctx.scan_zips && !is_dir && name.to_ascii_lowercase().ends_with(".zip") {
            zip_source::scan_archive(ctx, &path, root, records);
        }
    }
}

fn unix_mtime(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs() as i64)
}
