//! Index and server configuration loaded from a TOML document.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Top-level configuration: one server section plus any number of indexes.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub indexes: Vec<IndexConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Configuration of a single index.
///
/// `scan_workers = 0` means auto (twice the logical CPU count),
/// `refresh_interval = 0` means a scan runs on every invocation, and
/// `log_retention_days = 0` keeps scan logs forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub name: String,
    pub source_engine: String,
    pub db_path: PathBuf,
    pub root_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub refresh_interval: u64,
    pub scan_workers: usize,
    pub scan_zip_contents: bool,
    pub log_retention_days: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            source_engine: "local".to_string(),
            db_path: PathBuf::new(),
            root_paths: Vec::new(),
            exclude_paths: Vec::new(),
            refresh_interval: 0,
            scan_workers: 0,
            scan_zip_contents: false,
            log_retention_days: 30,
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
                path: path.display().to_string(),
            })?;
        let config: AppConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for idx in &self.indexes {
            if idx.name.is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "indexes.name".to_string(),
                    message: "index name must not be empty".to_string(),
                });
            }
            if !seen.insert(idx.name.as_str()) {
                return Err(ConfigError::ValidationFailed {
                    field: "indexes.name".to_string(),
                    message: format!("duplicate index name {:?}", idx.name),
                });
            }
            if idx.db_path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: format!("indexes.{}.db_path", idx.name),
                    message: "db_path must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}
