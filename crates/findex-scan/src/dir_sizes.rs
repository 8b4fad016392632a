//! Background directory-size aggregation.
//!
//! Runs against the live store after the atomic swap. Upserts are
//! committed in small transactions with a short sleep in between so
//! concurrent readers are never starved.

use std::path::Path;
use std::time::Duration;

use findex_core::errors::StorageError;
use findex_storage::connection;
use findex_storage::queries::dir_sizes;

const UPSERT_BATCH: usize = 500;
const YIELD_BETWEEN_BATCHES: Duration = Duration::from_millis(10);

/// Compute and cache the aggregate size of every directory in the store.
pub fn calculate(db_path: &Path, index_name: &str) -> Result<(), StorageError> {
    let conn = connection::open_store(db_path)?;
    let dirs = dir_sizes::all_directories(&conn)?;
    tracing::info!(
        index = index_name,
        directories = dirs.len(),
        "calculating directory sizes"
    );

    let total = dirs.len();
    let mut processed = 0usize;
    for chunk in dirs.chunks(UPSERT_BATCH) {
        connection::with_transaction(&conn, |tx| {
            for dir in chunk {
                let info = dir_sizes::compute_subtree(tx, dir)?;
                dir_sizes::upsert(tx, dir, info)?;
            }
            Ok(())
        })?;
        processed += chunk.len();
        if processed < total {
            tracing::debug!(index = index_name, processed, total, "directory size batch committed");
            std::thread::sleep(YIELD_BETWEEN_BATCHES);
        }
    }

    tracing::info!(
        index = index_name,
        directories = processed,
        "directory size calculation completed"
    );
    Ok(())
}
