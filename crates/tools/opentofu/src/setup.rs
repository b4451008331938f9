//! Resolve, install and verify in one call.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use usetofu_core::Result;
use usetofu_core::config::SetupConfig;
use usetofu_core::tools::{CurrentHost, DirToolCache, HostPlatform, SearchPath};

use crate::download::HttpDownloader;
use crate::evaluate::SemverEvaluator;
use crate::extract::FsExtractor;
use crate::installer::Installer;
use crate::manifest::HttpManifestSource;
use crate::resolver::VersionResolver;
use crate::verifier::{ProcessRunner, Verifier};

/// An installed and verified OpenTofu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTool {
    /// Resolved version.
    pub version: String,
    /// Installation directory, the one added to the search path.
    pub directory: PathBuf,
    /// Path of the `tofu` binary.
    pub binary: PathBuf,
}

/// The three setup stages, run in order.
pub struct OpenTofuSetup {
    resolver: VersionResolver,
    installer: Installer,
    verifier: Verifier,
}

impl OpenTofuSetup {
    /// Assemble a setup from its stages.
    #[must_use]
    pub fn new(resolver: VersionResolver, installer: Installer, verifier: Verifier) -> Self {
        Self {
            resolver,
            installer,
            verifier,
        }
    }

    /// Production wiring for `config`, using `search_path` for the smoke test.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built or the host architecture is
    /// unsupported.
    pub fn from_config(config: &SetupConfig, search_path: Arc<dyn SearchPath>) -> Result<Self> {
        let client = crate::http_client()?;
        let host: Arc<dyn HostPlatform> = Arc::new(CurrentHost);
        let cache = DirToolCache::new(config.tool_cache_dir(), host.arch()?);

        let resolver = VersionResolver::new(
            Arc::new(HttpManifestSource::new(
                client.clone(),
                config.manifest_url.clone(),
            )),
            Arc::new(SemverEvaluator),
        );
        let installer = Installer::new(
            Arc::new(cache),
            Arc::new(HttpDownloader::new(client, config.retry.clone())),
            Arc::new(FsExtractor),
            host.clone(),
            config.release_url.clone(),
            config.temp_dir(),
        );
        let verifier = Verifier::new(host, search_path, Arc::new(ProcessRunner));

        Ok(Self::new(resolver, installer, verifier))
    }

    /// Install the release matching `requested`.
    ///
    /// # Errors
    ///
    /// The first error of any stage, unchanged. A release downloaded by this
    /// run that fails verification is dropped from the cache.
    pub async fn run(&self, requested: &str) -> Result<InstalledTool> {
        let resolved = self.resolver.resolve(requested).await?;
        let installed = self
            .installer
            .install(&resolved.version, &resolved.files)
            .await?;
        let directory = installed.directory;

        let binary = match self.verifier.verify(&directory).await {
            Ok(binary) => binary,
            Err(e) => {
                if installed.downloaded {
                    self.discard(&resolved.version);
                }
                return Err(e);
            }
        };

        info!(version = %resolved.version, path = %directory.display(), "OpenTofu ready");
        Ok(InstalledTool {
            version: resolved.version,
            directory,
            binary,
        })
    }

    fn discard(&self, version: &str) {
        match self.installer.discard(version) {
            Ok(()) => info!(version, "Dropped unverified OpenTofu from cache"),
            Err(e) => warn!(version, error = %e, "Could not drop unverified cache entry"),
        }
    }
}
