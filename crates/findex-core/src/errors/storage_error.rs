//! Storage-layer errors for SQLite operations.

/// Errors that can occur in the embedded index store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {message}")]
    Sqlite { message: String },

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("stats decode error: {message}")]
    Decode { message: String },
}
