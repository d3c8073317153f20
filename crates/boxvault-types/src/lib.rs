//! Foundation types for boxvault.
//!
//! This crate provides the address scheme and metadata types used throughout
//! the boxvault system. Every other boxvault crate depends on
//! `boxvault-types`.
//!
//! # Key Types
//!
//! - [`BoxAddress`] — logical `owner/name` key identifying a box
//! - [`ArtifactAddress`] — versioned, provider-specific key under a box
//! - [`BaseUrl`] — request-scoped scheme/host/port for download URLs
//! - [`BoxMetadata`] / [`Inventory`] — catalog listings the request layer
//!   serializes
//!
//! Everything here is a pure mapping: no filesystem access, no side effects.
//! Containment of the resulting relative paths is enforced by the store, not
//! by these types.

pub mod address;
pub mod metadata;

pub use address::{ArtifactAddress, BaseUrl, BoxAddress};
pub use metadata::{BoxMetadata, Inventory, ProviderMetadata, VersionMetadata};
