//! Error types for catalog operations.

use thiserror::Error;

/// Errors that can occur during catalog operations.
///
/// Store errors pass through untranslated so the request layer can map
/// `PathEscape` and `NotFound` to the right responses.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Underlying store failure, surfaced unchanged.
    #[error(transparent)]
    Store(#[from] boxvault_store::StoreError),
}

/// Convenience type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
