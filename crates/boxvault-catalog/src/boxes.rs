//! Boxes: the `owner/name` level of the catalog.

use boxvault_store::Filestore;
use boxvault_types::{BaseUrl, BoxAddress, BoxMetadata, Inventory, VersionMetadata};

use crate::artifact::ProviderArtifact;
use crate::error::Result;

/// A box: all versions and providers stored under one `owner/name`.
#[derive(Clone, Debug)]
pub struct BoxEntry {
    address: BoxAddress,
    store: Filestore,
}

impl BoxEntry {
    /// Bind a box address to a store.
    pub fn new(address: BoxAddress, store: Filestore) -> Self {
        Self { address, store }
    }

    /// The logical address of this box.
    pub fn address(&self) -> &BoxAddress {
        &self.address
    }

    /// True iff at least one version exists under this box.
    pub fn exists(&self) -> Result<bool> {
        Ok(!self.versions()?.is_empty())
    }

    /// Version directories under this box, in enumeration order.
    pub fn versions(&self) -> Result<Vec<String>> {
        Ok(self.store.directories_in(&self.address.relative_path())?)
    }

    /// Provider directories under one version of this box.
    pub fn providers(&self, version: &str) -> Result<Vec<String>> {
        let path = format!("{}/{}", self.address.relative_path(), version);
        Ok(self.store.directories_in(&path)?)
    }

    /// A handle on one provider artifact under this box.
    pub fn artifact(&self, version: &str, provider: &str) -> ProviderArtifact {
        ProviderArtifact::new(self.address.artifact(version, provider), self.store.clone())
    }

    /// The full listing body for this box: every version with every provider
    /// whose payload is present, download URLs included.
    pub fn metadata(&self, base: &BaseUrl) -> Result<BoxMetadata> {
        let mut versions = Vec::new();
        for version in self.versions()? {
            let mut providers = Vec::new();
            for provider in self.providers(&version)? {
                if let Some(meta) = self.artifact(&version, &provider).metadata(base)? {
                    providers.push(meta);
                }
            }
            versions.push(VersionMetadata { version, providers });
        }
        Ok(BoxMetadata {
            name: self.address.name.clone(),
            username: self.address.owner.clone(),
            versions,
        })
    }
}

/// Top-level inventory: every box the store knows about.
pub fn inventory(store: &Filestore) -> Result<Inventory> {
    Ok(Inventory {
        boxes: store.boxes()?,
    })
}
