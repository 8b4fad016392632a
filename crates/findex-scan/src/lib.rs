//! Scan pipeline: parallel directory walking with ZIP descent, per-scan
//! gzip logging, and atomic index builds with background directory-size
//! aggregation.
//!
//! The entry point is [`run`], which loads a configuration file and
//! rebuilds every index that is due. Individual pieces are exposed for
//! embedding: [`walker::LocalSource`], [`coordinator::scan_indexes`],
//! [`logger::ScanLogger`].

pub mod coordinator;
pub mod dir_sizes;
pub mod init;
pub mod logger;
pub mod walker;
pub mod zip_source;

use std::path::Path;

use findex_core::config::AppConfig;
use findex_core::errors::ScanError;

/// Load configuration from `config_path`, initialize the configured
/// stores, and scan every index. `force` overrides each index's
/// refresh-interval guard.
pub fn run(config_path: &Path, force: bool) -> Result<(), ScanError> {
    let cfg = AppConfig::load(config_path)?;
    init::ensure_indexes(&cfg)?;
    coordinator::scan_indexes(&cfg, force);
    Ok(())
}
