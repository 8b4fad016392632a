//! Index lifecycle: ensure every configured store exists, prune stores
//! no configuration entry claims anymore.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use findex_core::config::AppConfig;
use findex_core::errors::ScanError;
use findex_storage::connection;

/// Create and migrate the store of every `local` index, then remove
/// `.db` files in the same directories that no index claims (leftovers
/// of renamed or deleted indexes). Non-local engines are reported and
/// skipped; a store that cannot be initialized fails this call.
pub fn ensure_indexes(cfg: &AppConfig) -> Result<(), ScanError> {
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut data_dirs: HashSet<PathBuf> = HashSet::new();

    for idx in &cfg.indexes {
        if idx.source_engine != "local" {
            tracing::warn!(
                index = %idx.name,
                source_engine = %idx.source_engine,
                "unsupported source engine, store not initialized"
            );
            continue;
        }
        let db_path = std::path::absolute(&idx.db_path).map_err(|e| ScanError::Io {
            path: idx.db_path.clone(),
            source: e,
        })?;
        connection::open_store(&db_path)?;
        if let Some(parent) = db_path.parent() {
            data_dirs.insert(parent.to_path_buf());
        }
        claimed.insert(db_path);
    }

    for dir in data_dirs {
        prune_unclaimed_stores(&dir, &claimed);
    }
    Ok(())
}

/// Remove `.db` files in `dir` that are not in the claimed set. Journal
/// side files and scan logs are left alone; SQLite recreates or ignores
/// them as needed.
fn prune_unclaimed_stores(dir: &Path, claimed: &HashSet<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(true, |e| e != "db") {
            continue;
        }
        if claimed.contains(&path) {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::info!(store = %path.display(), "removed unclaimed index store"),
            Err(err) => {
                tracing::warn!(store = %path.display(), error = %err, "cannot remove unclaimed store");
            }
        }
    }
}
