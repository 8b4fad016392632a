//! V001: initial schema.
//! files + FTS index, metadata, dir_sizes cache, scan_history ring.

pub const MIGRATION_SQL: &str = r#"
-- One row per filesystem (or in-archive) entry seen by the last scan.
-- is_searchable is the tri-state scan lifecycle flag: 0 legacy, 1 newly
-- inserted, 2 finalized. Live stores only ever contain 2.
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY,
    index_name TEXT,
    path TEXT NOT NULL UNIQUE,
    name TEXT,
    dir TEXT,
    dir_index INTEGER,
    ext TEXT,
    size INTEGER,
    mod_time INTEGER,
    is_dir INTEGER,
    is_searchable INTEGER DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_files_path ON files(path);
CREATE INDEX IF NOT EXISTS idx_files_dir_index ON files(dir_index);

-- External-content FTS over (name, path); rowid mirrors files.id and the
-- index is rebuilt wholesale at finalize, so no sync triggers exist.
CREATE VIRTUAL TABLE IF NOT EXISTS files_fts USING fts5(
    name, path,
    content='files',
    content_rowid='id',
    tokenize='unicode61'
);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT
);

-- path -> (total_size, file_count) over all descendant non-directory rows.
CREATE TABLE IF NOT EXISTS dir_sizes (
    path TEXT PRIMARY KEY,
    total_size INTEGER,
    file_count INTEGER
);

CREATE TABLE IF NOT EXISTS scan_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scan_time INTEGER NOT NULL,
    stats_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_scan_history_time ON scan_history(scan_time DESC);
"#;
