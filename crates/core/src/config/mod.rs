//! Configuration types for a usetofu run

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::retry::RetryConfig;
use crate::tools::default_cache_dir;

/// Specifier that selects the newest release.
pub const LATEST: &str = "latest";

/// Location of the OpenTofu version manifest.
pub const DEFAULT_MANIFEST_URL: &str = "https://get.opentofu.org/tofu/api.json";

/// Base URL of OpenTofu release downloads.
pub const DEFAULT_RELEASE_URL: &str = "https://github.com/opentofu/opentofu/releases/download";

/// Settings for one setup run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetupConfig {
    /// Requested version specifier; empty means [`LATEST`]
    #[serde(default)]
    pub version: String,

    /// Version manifest endpoint
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,

    /// Release download base URL
    #[serde(default = "default_release_url")]
    pub release_url: String,

    /// Tool cache root, defaults to the user cache directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_cache: Option<PathBuf>,

    /// Scratch directory for downloads and extraction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,

    /// Download retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            version: String::new(),
            manifest_url: default_manifest_url(),
            release_url: default_release_url(),
            tool_cache: None,
            temp_dir: None,
            retry: RetryConfig::default(),
        }
    }
}

impl SetupConfig {
    /// Create a config with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requested version specifier.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set the manifest URL.
    #[must_use]
    pub fn with_manifest_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_url = url.into();
        self
    }

    /// Set the release download base URL.
    #[must_use]
    pub fn with_release_url(mut self, url: impl Into<String>) -> Self {
        self.release_url = url.into();
        self
    }

    /// Set the tool cache root.
    #[must_use]
    pub fn with_tool_cache(mut self, path: PathBuf) -> Self {
        self.tool_cache = Some(path);
        self
    }

    /// Set the scratch directory.
    #[must_use]
    pub fn with_temp_dir(mut self, path: PathBuf) -> Self {
        self.temp_dir = Some(path);
        self
    }

    /// Set the number of download attempts.
    #[must_use]
    pub fn with_download_attempts(mut self, attempts: u32) -> Self {
        self.retry = self.retry.with_max_attempts(attempts);
        self
    }

    /// The specifier to resolve; blank input means [`LATEST`].
    #[must_use]
    pub fn specifier(&self) -> &str {
        let trimmed = self.version.trim();
        if trimmed.is_empty() { LATEST } else { trimmed }
    }

    /// Get the tool cache root, defaulting to ~/.cache/usetofu/tools.
    #[must_use]
    pub fn tool_cache_dir(&self) -> PathBuf {
        self.tool_cache.clone().unwrap_or_else(default_cache_dir)
    }

    /// Get the scratch directory, defaulting to the system temp dir.
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("usetofu"))
    }
}

fn default_manifest_url() -> String {
    DEFAULT_MANIFEST_URL.to_string()
}

fn default_release_url() -> String {
    DEFAULT_RELEASE_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SetupConfig::default();
        assert_eq!(config.manifest_url, "https://get.opentofu.org/tofu/api.json");
        assert_eq!(
            config.release_url,
            "https://github.com/opentofu/opentofu/releases/download"
        );
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.specifier(), "latest");
    }

    #[test]
    fn test_blank_version_means_latest() {
        assert_eq!(SetupConfig::new().with_version("   ").specifier(), "latest");
        assert_eq!(SetupConfig::new().with_version(" 1.9.0 ").specifier(), "1.9.0");
    }

    #[test]
    fn test_builders() {
        let config = SetupConfig::new()
            .with_tool_cache(PathBuf::from("/agent/tools"))
            .with_temp_dir(PathBuf::from("/agent/tmp"))
            .with_download_attempts(2);

        assert_eq!(config.tool_cache_dir(), PathBuf::from("/agent/tools"));
        assert_eq!(config.temp_dir(), PathBuf::from("/agent/tmp"));
        assert_eq!(config.retry.max_attempts, 2);
    }

    #[test]
    fn test_default_cache_dir_location() {
        let dir = SetupConfig::default().tool_cache_dir();
        assert!(dir.ends_with("usetofu/tools"));
    }
}
