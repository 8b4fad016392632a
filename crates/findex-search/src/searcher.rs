//! Multi-index search, browse, and directory-size queries.

use std::collections::HashMap;

use rusqlite::{params, Connection};

use findex_core::config::IndexConfig;
use findex_core::errors::{SearchError, StorageError};
use findex_core::models::{DirInfo, FileRecord};
use findex_core::paths;
use findex_storage::connection;
use findex_storage::queries::{dir_sizes, files};

use crate::fts;

/// Structured filters, AND-composed with each other and with the FTS
/// match. Zero values mean "no restriction".
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    pub min_size: i64,
    pub max_size: i64,
    pub exts: Vec<String>,
    pub mod_time_from: i64,
    pub mod_time_to: i64,
    pub only_files: bool,
    pub only_dirs: bool,
}

impl FileFilter {
    /// SQL conditions over the `files` alias `f`. Sizes and timestamps
    /// are numeric; extension values are quote-escaped.
    fn conditions(&self) -> Vec<String> {
        let mut conditions = Vec::new();
        if self.min_size > 0 {
            conditions.push(format!("f.size >= {}", self.min_size));
        }
        if self.max_size > 0 {
            conditions.push(format!("f.size <= {}", self.max_size));
        }
        if !self.exts.is_empty() {
            let alts: Vec<String> = self
                .exts
                .iter()
                .map(|e| {
                    let bare = e.trim_start_matches('.').replace('\'', "''");
                    format!("f.ext = '.{bare}'")
                })
                .collect();
            conditions.push(format!("({})", alts.join(" OR ")));
        }
        if self.mod_time_from > 0 {
            conditions.push(format!("f.mod_time >= {}", self.mod_time_from));
        }
        if self.mod_time_to > 0 {
            conditions.push(format!("f.mod_time <= {}", self.mod_time_to));
        }
        if self.only_files {
            conditions.push("f.is_dir = 0".to_string());
        }
        if self.only_dirs {
            conditions.push("f.is_dir = 1".to_string());
        }
        conditions
    }
}

/// Read handle over every configured index store.
pub struct Searcher {
    stores: HashMap<String, Connection>,
}

impl Searcher {
    /// Open every index store with the shared pragma policy. Missing
    /// stores come up empty rather than failing the whole set.
    pub fn open(indexes: &[IndexConfig]) -> Result<Self, SearchError> {
        let mut stores = HashMap::new();
        for idx in indexes {
            let conn = connection::open_store(&idx.db_path)?;
            stores.insert(idx.name.clone(), conn);
        }
        Ok(Self { stores })
    }

    /// Names of the opened indexes.
    pub fn index_names(&self) -> Vec<&str> {
        self.stores.keys().map(String::as_str).collect()
    }

    pub(crate) fn store(&self, index: &str) -> Result<&Connection, SearchError> {
        self.stores.get(index).ok_or_else(|| SearchError::UnknownIndex {
            name: index.to_string(),
        })
    }

    pub(crate) fn stores(&self) -> impl Iterator<Item = (&str, &Connection)> {
        self.stores.iter().map(|(name, conn)| (name.as_str(), conn))
    }

    /// Search every index independently and concatenate the results.
    /// An empty query with no active filter short-circuits to nothing.
    pub fn search(
        &self,
        query: &str,
        filter: &FileFilter,
        limit_per_index: usize,
    ) -> Result<Vec<FileRecord>, SearchError> {
        let mut results = Vec::new();
        for conn in self.stores.values() {
            results.extend(search_index(conn, query, filter, limit_per_index)?);
        }
        Ok(results)
    }

    /// Fetch one record by id.
    pub fn file_by_id(&self, index: &str, id: i64) -> Result<Option<FileRecord>, SearchError> {
        Ok(files::by_id(self.store(index)?, id)?)
    }

    /// List a directory.
    ///
    /// An empty path lists the immediate children of every root. A
    /// non-empty path is used directly when it lies under a known root,
    /// otherwise it is resolved relative to each root in turn. Returned
    /// directories carry their cached subtree size, computed and written
    /// back on a cache miss.
    pub fn list_directory(
        &self,
        index: &str,
        path: &str,
    ) -> Result<Vec<FileRecord>, SearchError> {
        let conn = self.store(index)?;
        tracing::debug!(index, path, "listing directory");

        let mut rows = if path.is_empty() {
            let mut rows = Vec::new();
            for root in files::distinct_roots(conn)? {
                rows.extend(files::children(
                    conn,
                    paths::dir_index_of(&root),
                    &root,
                )?);
            }
            rows
        } else {
            match resolve_path(conn, path)? {
                Some(resolved) => files::children(
                    conn,
                    paths::dir_index_of(&resolved),
                    &resolved,
                )?,
                None => Vec::new(),
            }
        };

        for row in &mut rows {
            if row.is_dir {
                row.size = self.subtree_info(conn, &row.path)?.size;
            }
        }
        Ok(rows)
    }

    /// Aggregate size of a directory subtree, with the same path
    /// resolution as [`Self::list_directory`]. The empty path sums every
    /// file in the index.
    pub fn dir_size(&self, index: &str, path: &str) -> Result<DirInfo, SearchError> {
        let conn = self.store(index)?;
        tracing::debug!(index, path, "directory size");

        if path.is_empty() {
            return Ok(dir_sizes::global(conn)?);
        }
        let resolved = match resolve_path(conn, path)? {
            Some(r) => r,
            None => return Ok(DirInfo::default()),
        };
        Ok(self.subtree_info(conn, &resolved)?)
    }

    /// Cached subtree aggregate, recomputed and written back on a miss.
    fn subtree_info(&self, conn: &Connection, path: &str) -> Result<DirInfo, StorageError> {
        if let Some(info) = dir_sizes::cached(conn, path)? {
            return Ok(info);
        }
        let info = dir_sizes::compute_subtree(conn, path)?;
        dir_sizes::upsert(conn, path, info)?;
        Ok(info)
    }
}

/// Resolve a browse path against the roots recorded in the store:
/// absolute under a known root wins outright, otherwise the first root
/// whose `<root>/<path>` has at least one child row.
fn resolve_path(conn: &Connection, path: &str) -> Result<Option<String>, StorageError> {
    let roots = files::distinct_roots(conn)?;
    for root in &roots {
        if path == root || path.starts_with(&format!("{root}/")) {
            return Ok(Some(path.to_string()));
        }
    }
    let rel = path.trim_start_matches('/');
    for root in &roots {
        let candidate = paths::join(root, rel);
        if files::has_children(conn, paths::dir_index_of(&candidate), &candidate)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// One index's share of a search.
fn search_index(
    conn: &Connection,
    query: &str,
    filter: &FileFilter,
    limit: usize,
) -> Result<Vec<FileRecord>, StorageError> {
    let conditions = filter.conditions();
    if query.is_empty() && conditions.is_empty() {
        return Ok(Vec::new());
    }

    let rows = if query.is_empty() {
        // Filter-only search, newest first.
        let sql = format!(
            "SELECT {} FROM files f WHERE {} ORDER BY f.mod_time DESC LIMIT ?1",
            file_columns(),
            conditions.join(" AND "),
        );
        let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
        let rows = stmt
            .query_map(params![limit as i64], files::map_file_row)
            .map_err(sql_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)?
    } else {
        let match_expr = fts::prepare_match_query(query);
        let and_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" AND {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM files f
             JOIN files_fts ft ON ft.rowid = f.id
             WHERE files_fts MATCH ?1{and_clause}
             LIMIT ?2",
            file_columns(),
        );
        let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
        let rows = stmt
            .query_map(params![match_expr, limit as i64], files::map_file_row)
            .map_err(sql_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(sql_err)?
    };

    Ok(rows)
}

/// `FILE_COLUMNS` qualified with the `f` alias.
fn file_columns() -> String {
    files::FILE_COLUMNS
        .split(", ")
        .map(|c| format!("f.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn sql_err(e: rusqlite::Error) -> StorageError {
    StorageError::Sqlite {
        message: e.to_string(),
    }
}
