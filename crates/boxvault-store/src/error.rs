//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The supplied relative path normalizes outside the store root.
    /// Raised before any filesystem access is attempted with the path.
    #[error("path escapes store root: {path}")]
    PathEscape { path: String },

    /// The target of a read or delete does not exist.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// An atomic write failed. Carries the underlying I/O error; cleanup of
    /// the `.txn` and `.lock` siblings has already run when this surfaces.
    #[error("write to {path} failed: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error from any other filesystem operation.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
