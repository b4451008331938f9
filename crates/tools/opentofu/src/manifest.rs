//! OpenTofu version manifest.
//!
//! The manifest lists every release together with the archive file names
//! published for it:
//!
//! ```json
//! {
//!   "versions": [
//!     { "id": "1.10.2", "files": ["tofu_1.10.2_linux_amd64.tar.gz", "..."] }
//!   ]
//! }
//! ```
//!
//! It is refetched on every run and never cached.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use usetofu_core::{Error, Result};

/// One release in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Version identifier, e.g. "1.10.2".
    pub id: String,
    /// Archive file names published for this version.
    #[serde(default)]
    pub files: Vec<String>,
}

/// Releases in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionManifest {
    /// All published releases.
    pub versions: Vec<ManifestEntry>,
}

impl VersionManifest {
    /// Decode a manifest body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionParse`] when the body is not a manifest.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::version_parse(e.to_string()))
    }

    /// Version identifiers, in manifest order.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.versions.iter().map(|v| v.id.as_str()).collect()
    }

    /// Find the entry with exactly this identifier.
    #[must_use]
    pub fn entry(&self, id: &str) -> Option<&ManifestEntry> {
        self.versions.iter().find(|v| v.id == id)
    }
}

/// Where the manifest comes from.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetch the current manifest.
    ///
    /// # Errors
    ///
    /// [`Error::VersionFetch`] / [`Error::VersionStatus`] when the request
    /// fails, [`Error::VersionParse`] when the body cannot be decoded.
    async fn fetch(&self) -> Result<VersionManifest>;
}

/// Manifest served over HTTP.
pub struct HttpManifestSource {
    client: Client,
    url: String,
}

impl HttpManifestSource {
    /// Create a source for the given URL.
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// The manifest URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ManifestSource for HttpManifestSource {
    async fn fetch(&self) -> Result<VersionManifest> {
        debug!(url = %self.url, "Fetching OpenTofu version manifest");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::version_fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::version_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::version_parse(e.to_string()))?;

        let manifest = VersionManifest::from_slice(&body)?;
        debug!(versions = manifest.versions.len(), "Fetched version manifest");
        Ok(manifest)
    }
}
