//! Error types for report classification and extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors raised while classifying or extracting a report file.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no extractor registered for report type '{0}'")]
    UnknownReportType(String),

    #[error("malformed metadata line {line:?}: {reason}")]
    Metadata { line: String, reason: String },

    #[error("report table has no column '{0}'")]
    MissingColumn(String),

    #[error("report is missing element {0}")]
    MissingElement(String),

    #[error("cannot cast {field} value '{value}' to {expected}")]
    Coercion {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("record set columns have unequal lengths")]
    RaggedColumns,

    #[error("malformed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("malformed delimited table: {0}")]
    Csv(#[from] csv::Error),
}
