//! Provider artifacts: the versioned, provider-specific payloads under a
//! box.

use std::io::Read;
use std::path::PathBuf;

use boxvault_store::Filestore;
use boxvault_types::{ArtifactAddress, BaseUrl, ProviderMetadata};
use tracing::debug;

use crate::error::Result;

/// One provider's payload for one version of a box.
///
/// All state lives in the store; this is a handle binding an address to a
/// [`Filestore`].
#[derive(Clone, Debug)]
pub struct ProviderArtifact {
    address: ArtifactAddress,
    store: Filestore,
}

impl ProviderArtifact {
    /// Bind an artifact address to a store.
    pub fn new(address: ArtifactAddress, store: Filestore) -> Self {
        Self { address, store }
    }

    /// The logical address of this artifact.
    pub fn address(&self) -> &ArtifactAddress {
        &self.address
    }

    /// True iff the payload file exists.
    pub fn exists(&self) -> Result<bool> {
        Ok(self.store.exists(&self.address.payload_path())?)
    }

    /// Atomically write the payload from `reader`.
    pub fn write<R: Read>(&self, reader: R) -> Result<()> {
        self.store.write(&self.address.payload_path(), reader)?;
        debug!(artifact = %self.address, "artifact stored");
        Ok(())
    }

    /// Read the full payload.
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(self.store.read(&self.address.payload_path())?)
    }

    /// Absolute location of the payload file, for callers that stream it out
    /// themselves. Containment-checked like every other path.
    pub fn resolved_payload_path(&self) -> Result<PathBuf> {
        Ok(self.store.resolve(&self.address.payload_path())?)
    }

    /// Delete the payload if it exists, then prune any directory chain the
    /// deletion emptied.
    ///
    /// Idempotent: deleting an absent artifact only runs the prune.
    pub fn delete(&self) -> Result<()> {
        if self.exists()? {
            self.store.delete(&self.address.payload_path())?;
            debug!(artifact = %self.address, "artifact deleted");
        }
        self.store.delete_empty_dirs()?;
        Ok(())
    }

    /// Listing entry for this artifact, or `None` if the payload is absent.
    pub fn metadata(&self, base: &BaseUrl) -> Result<Option<ProviderMetadata>> {
        if !self.exists()? {
            return Ok(None);
        }
        Ok(Some(ProviderMetadata {
            name: self.address.provider.clone(),
            url: self.address.download_url(base),
        }))
    }
}
