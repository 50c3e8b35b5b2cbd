use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for upload-pipeline operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Error type shared across the reader, schema, and upload layers.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Underlying I/O error (file not found, permission denied, short read).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file could not be parsed in the inferred or requested format.
    #[error("format error in {path}: {message}")]
    Format { path: PathBuf, message: String },

    /// A tile name could not be extracted from the filename.
    #[error("no tile name of the form DESnnnn[+-]nnnn in filename: {filename}")]
    Pattern { filename: String },

    /// A precondition on the requested options failed.
    #[error("configuration error: {0}")]
    Config(String),

    /// DDL execution failed (name collision, invalid type, privilege).
    #[error("schema statement failed: {0}")]
    Schema(#[source] rusqlite::Error),

    /// A batch insert failed, or its row/column invariants were violated.
    #[error("insert failed: {0}")]
    Insert(String),

    /// Any other database-layer failure.
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl UploadError {
    pub fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
        }
    }
}
