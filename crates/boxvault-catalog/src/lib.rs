//! High-level catalog API for boxvault.
//!
//! Composes the address scheme from `boxvault-types` with the storage engine
//! from `boxvault-store` into the domain operations the request layer calls:
//! box listings, provider-artifact upload/download/delete, and the top-level
//! inventory. This is the main entry point for applications embedding
//! boxvault.

pub mod artifact;
pub mod boxes;
pub mod error;

pub use artifact::ProviderArtifact;
pub use boxes::{inventory, BoxEntry};
pub use error::{CatalogError, Result};

// Re-export key types
pub use boxvault_store::Filestore;
pub use boxvault_types::{ArtifactAddress, BaseUrl, BoxAddress, BoxMetadata, Inventory};
