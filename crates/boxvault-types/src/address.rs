//! The address scheme: deterministic mapping from logical keys to the
//! relative path conventions the store consumes.
//!
//! Layout under the store root:
//!
//! ```text
//! {owner}/{name}                          -- box
//! {owner}/{name}/{version}/{provider}     -- provider artifact
//! {owner}/{name}/{version}/{provider}/box -- artifact payload file
//! ```

use serde::{Deserialize, Serialize};

/// File name of the physical payload below an artifact directory.
pub const PAYLOAD_FILE: &str = "box";

/// Logical key identifying a box: `owner/name`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoxAddress {
    /// Owning namespace (e.g. a user or organization).
    pub owner: String,
    /// Box name within the owner's namespace.
    pub name: String,
}

impl BoxAddress {
    /// Create a new box address.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Relative path of the box directory: `owner/name`.
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Address of a provider artifact under this box.
    pub fn artifact(&self, version: impl Into<String>, provider: impl Into<String>) -> ArtifactAddress {
        ArtifactAddress {
            box_addr: self.clone(),
            version: version.into(),
            provider: provider.into(),
        }
    }
}

impl std::fmt::Display for BoxAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Logical key identifying a versioned, provider-specific artifact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactAddress {
    /// The box this artifact belongs to.
    pub box_addr: BoxAddress,
    /// Version string (e.g. `1.0.2`).
    pub version: String,
    /// Provider name (e.g. `virtualbox`, `libvirt`).
    pub provider: String,
}

impl ArtifactAddress {
    /// Relative path of the artifact directory:
    /// `owner/name/version/provider`.
    pub fn relative_path(&self) -> String {
        format!(
            "{}/{}/{}",
            self.box_addr.relative_path(),
            self.version,
            self.provider
        )
    }

    /// Relative path of the physical payload file:
    /// `owner/name/version/provider/box`.
    pub fn payload_path(&self) -> String {
        format!("{}/{}", self.relative_path(), PAYLOAD_FILE)
    }

    /// Download URL for this artifact against a request-scoped base.
    ///
    /// Presentation output consumed by the request layer; the store never
    /// sees URLs.
    pub fn download_url(&self, base: &BaseUrl) -> String {
        format!("{}/{}", base, self.relative_path())
    }
}

impl std::fmt::Display for ArtifactAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.relative_path())
    }
}

/// Request-scoped URL parts used to build download links.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseUrl {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl BaseUrl {
    /// Create a new base URL from its parts.
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}
