//! Error types for the synchronization pipeline.

use ieso_reports::ReportError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Errors raised while merging report files into the target store.
#[derive(Error, Debug)]
pub enum SyncError {
    /// SQL query or connection error.
    #[error("database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Classification or extraction failure for one file.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Database configuration is invalid or missing.
    #[error("database configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),

    /// An identifier failed the allow-list used for names spliced into SQL.
    #[error("invalid SQL identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("table {schema}.{table} does not exist or has no columns")]
    TableNotFound { schema: String, table: String },

    #[error("table {schema}.{table} has no primary key to merge on")]
    MissingPrimaryKey { schema: String, table: String },

    /// An extractor output column has no counterpart in the target table.
    #[error("extractor column '{column}' does not exist in {schema}.{table}")]
    UnknownColumn {
        column: String,
        schema: String,
        table: String,
    },
}
