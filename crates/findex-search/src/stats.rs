//! Live statistics queries and the global roll-up.

use std::collections::HashMap;

use findex_core::errors::{SearchError, StorageError};
use findex_core::models::{
    ExtensionStats, GlobalStats, IndexStats, ScanHistoryEntry, SizeRange, YearStats,
};
use findex_storage::queries::{metadata, scan_history};
use findex_storage::stats::{compute_index_stats, SIZE_BUCKETS};

use crate::searcher::Searcher;

const TOP_EXTENSIONS: usize = 15;

impl Searcher {
    /// Live statistics of one index.
    pub fn index_stats(&self, index: &str) -> Result<IndexStats, SearchError> {
        Ok(compute_index_stats(self.store(index)?, index)?)
    }

    /// The statistics snapshot the last completed scan cached in
    /// `metadata`, if any. Cheaper than a live read and stable while a
    /// background writer is busy.
    pub fn cached_index_stats(&self, index: &str) -> Result<Option<IndexStats>, SearchError> {
        let conn = self.store(index)?;
        let Some(json) = metadata::get(conn, metadata::KEY_STATS_CACHE)? else {
            return Ok(None);
        };
        let stats: IndexStats =
            serde_json::from_str(&json).map_err(|e| StorageError::Decode {
                message: e.to_string(),
            })?;
        Ok(Some(stats))
    }

    /// Roll-up over every opened index. Indexes that fail to answer are
    /// skipped rather than failing the whole aggregate.
    pub fn global_stats(&self) -> Result<GlobalStats, SearchError> {
        let mut global = GlobalStats::default();

        let mut ext_by_count: HashMap<String, ExtensionStats> = HashMap::new();
        let mut ext_by_size: HashMap<String, ExtensionStats> = HashMap::new();
        let mut size_dist: HashMap<String, SizeRange> = HashMap::new();
        let mut year_dist: HashMap<i32, YearStats> = HashMap::new();

        for (name, conn) in self.stores() {
            global.index_count += 1;
            let stats = match compute_index_stats(conn, name) {
                Ok(s) => s,
                Err(err) => {
                    tracing::warn!(index = name, error = %err, "index stats unavailable");
                    continue;
                }
            };

            global.total_files += stats.total_files;
            global.total_dirs += stats.total_dirs;
            global.total_size += stats.total_size;

            merge_extensions(&mut ext_by_count, &stats.top_extensions);
            merge_extensions(&mut ext_by_size, &stats.top_ext_by_size);
            for bucket in &stats.size_distribution {
                let slot = size_dist
                    .entry(bucket.label.clone())
                    .or_insert_with(|| SizeRange {
                        label: bucket.label.clone(),
                        count: 0,
                        size: 0,
                    });
                slot.count += bucket.count;
                slot.size += bucket.size;
            }
            for year in &stats.year_distribution {
                let slot = year_dist.entry(year.year).or_insert_with(|| YearStats {
                    year: year.year,
                    count: 0,
                    size: 0,
                });
                slot.count += year.count;
                slot.size += year.size;
            }

            global.index_stats.push(stats);
        }

        global.top_extensions = top_n(ext_by_count, |e| e.count);
        global.top_ext_by_size = top_n(ext_by_size, |e| e.size);

        // The histogram keeps its fixed bucket order.
        for (label, _, _) in SIZE_BUCKETS {
            if let Some(bucket) = size_dist.remove(label) {
                global.size_distribution.push(bucket);
            }
        }

        let mut years: Vec<YearStats> = year_dist.into_values().collect();
        years.sort_unstable_by_key(|y| std::cmp::Reverse(y.year));
        global.year_distribution = years;

        Ok(global)
    }

    /// The newest `limit` scan snapshots of one index.
    pub fn scan_history(
        &self,
        index: &str,
        limit: usize,
    ) -> Result<Vec<ScanHistoryEntry>, SearchError> {
        Ok(scan_history::recent(self.store(index)?, limit)?)
    }
}

fn merge_extensions(acc: &mut HashMap<String, ExtensionStats>, items: &[ExtensionStats]) {
    for ext in items {
        let slot = acc
            .entry(ext.extension.clone())
            .or_insert_with(|| ExtensionStats {
                extension: ext.extension.clone(),
                count: 0,
                size: 0,
            });
        slot.count += ext.count;
        slot.size += ext.size;
    }
}

fn top_n<K: Fn(&ExtensionStats) -> i64>(
    acc: HashMap<String, ExtensionStats>,
    key: K,
) -> Vec<ExtensionStats> {
    let mut items: Vec<ExtensionStats> = acc.into_values().collect();
    items.sort_unstable_by_key(|e| std::cmp::Reverse(key(e)));
    items.truncate(TOP_EXTENSIONS);
    items
}
