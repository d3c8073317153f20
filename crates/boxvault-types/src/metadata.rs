//! Catalog metadata: the listing bodies the request layer serializes.

use serde::{Deserialize, Serialize};

/// One provider entry in a box listing: the provider name and where to
/// download its payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMetadata {
    pub name: String,
    pub url: String,
}

/// One version of a box with its available providers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub version: String,
    pub providers: Vec<ProviderMetadata>,
}

/// Full listing for a single box.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxMetadata {
    pub name: String,
    pub username: String,
    pub versions: Vec<VersionMetadata>,
}

/// Top-level inventory: every `owner/name` pair known to the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub boxes: Vec<String>,
}
