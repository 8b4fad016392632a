//! Configuration parsing and validation.

use findex_core::config::AppConfig;
use findex_core::errors::ConfigError;

const SAMPLE: &str = r#"
[server]
port = 9090

[[indexes]]
name = "media"
source_engine = "local"
db_path = "data/media.db"
root_paths = ["/mnt/media", "/mnt/photos"]
exclude_paths = ["/mnt/media/tmp", "*.bak"]
refresh_interval = 3600
scan_workers = 4
scan_zip_contents = true

[[indexes]]
name = "docs"
db_path = "data/docs.db"
root_paths = ["/srv/docs"]
"#;

#[test]
fn parses_full_document() {
    let cfg = AppConfig::from_toml(SAMPLE).unwrap();
    assert_eq!(cfg.server.port, 9090);
    assert_eq!(cfg.indexes.len(), 2);

    let media = &cfg.indexes[0];
    assert_eq!(media.name, "media");
    assert_eq!(media.source_engine, "local");
    assert_eq!(media.root_paths.len(), 2);
    assert_eq!(media.exclude_paths, vec!["/mnt/media/tmp", "*.bak"]);
    assert_eq!(media.refresh_interval, 3600);
    assert_eq!(media.scan_workers, 4);
    assert!(media.scan_zip_contents);

    cfg.validate().unwrap();
}

#[test]
fn defaults_applied_to_sparse_index() {
    let cfg = AppConfig::from_toml(SAMPLE).unwrap();
    let docs = &cfg.indexes[1];
    assert_eq!(docs.source_engine, "local");
    assert_eq!(docs.refresh_interval, 0);
    assert_eq!(docs.scan_workers, 0);
    assert!(!docs.scan_zip_contents);
    assert_eq!(docs.log_retention_days, 30);
}

#[test]
fn empty_document_is_valid() {
    let cfg = AppConfig::from_toml("").unwrap();
    assert_eq!(cfg.server.port, 8080);
    assert!(cfg.indexes.is_empty());
    cfg.validate().unwrap();
}

#[test]
fn unknown_source_engine_survives_parsing() {
    let cfg = AppConfig::from_toml(
        r#"
        [[indexes]]
        name = "remote"
        source_engine = "s3"
        db_path = "data/remote.db"
        "#,
    )
    .unwrap();
    assert_eq!(cfg.indexes[0].source_engine, "s3");
    cfg.validate().unwrap();
}

#[test]
fn duplicate_index_names_rejected() {
    let cfg = AppConfig::from_toml(
        r#"
        [[indexes]]
        name = "a"
        db_path = "a.db"

        [[indexes]]
        name = "a"
        db_path = "b.db"
        "#,
    )
    .unwrap();
    let err = cfg.validate().unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { .. }));
}

#[test]
fn empty_db_path_rejected() {
    let cfg = AppConfig::from_toml(
        r#"
        [[indexes]]
        name = "a"
        "#,
    )
    .unwrap();
    assert!(cfg.validate().is_err());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = AppConfig::from_toml("[server\nport = ]").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn load_reports_missing_file() {
    let err = AppConfig::load(std::path::Path::new("/no/such/findex.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}

#[test]
fn load_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("findex.toml");
    std::fs::write(&path, SAMPLE).unwrap();
    let cfg = AppConfig::load(&path).unwrap();
    assert_eq!(cfg.indexes.len(), 2);
}
