//! Versioned tool cache.
//!
//! Installed tools are kept in a long-lived directory owned by the host
//! (a pipeline agent's tools directory or the user cache). Each entry is keyed
//! by tool name and version.
//!
//! Structure:
//! ```text
//! {root}/
//! └── opentofu/
//!     └── 1.10.2/
//!         ├── amd64/          # Extracted release contents
//!         │   └── tofu
//!         └── amd64.complete  # Written last, marks the entry usable
//! ```

use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

use super::platform::Arch;
use crate::{Error, Result};

/// Lookup and registration of installed tool directories.
pub trait ToolCache: Send + Sync {
    /// Find a registered tool directory.
    ///
    /// Returns `None` when the `(name, version)` entry is absent or incomplete.
    fn find(&self, name: &str, version: &str) -> Option<PathBuf>;

    /// Register the contents of `source` under `(name, version)`.
    ///
    /// Returns the directory the entry now lives in, which may differ from
    /// `source`.
    ///
    /// # Errors
    ///
    /// Fails if the entry cannot be written. A failed registration leaves no
    /// usable entry behind.
    fn register(&self, source: &Path, name: &str, version: &str) -> Result<PathBuf>;

    /// Drop the `(name, version)` entry so the next lookup misses.
    ///
    /// Removing an absent entry succeeds.
    ///
    /// # Errors
    ///
    /// Fails if the entry exists but cannot be deleted.
    fn remove(&self, name: &str, version: &str) -> Result<()>;
}

/// Directory-backed tool cache.
///
/// Default location: `~/.cache/usetofu/tools/`
#[derive(Debug, Clone)]
pub struct DirToolCache {
    root: PathBuf,
    arch: Arch,
}

impl DirToolCache {
    /// Create a cache at the specified root directory.
    #[must_use]
    pub fn new(root: PathBuf, arch: Arch) -> Self {
        Self { root, arch }
    }

    /// Get the cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the tool's files for a version.
    #[must_use]
    pub fn entry_dir(&self, name: &str, version: &str) -> PathBuf {
        self.version_dir(name, version).join(self.arch.as_str())
    }

    fn version_dir(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(clean_version(version))
    }

    fn marker_path(&self, name: &str, version: &str) -> PathBuf {
        self.version_dir(name, version)
            .join(format!("{}.complete", self.arch.as_str()))
    }
}

impl ToolCache for DirToolCache {
    fn find(&self, name: &str, version: &str) -> Option<PathBuf> {
        let dir = self.entry_dir(name, version);
        if self.marker_path(name, version).is_file() && dir.is_dir() {
            trace!(name, version, ?dir, "Cache hit for tool");
            Some(dir)
        } else {
            trace!(name, version, "Cache miss for tool");
            None
        }
    }

    fn register(&self, source: &Path, name: &str, version: &str) -> Result<PathBuf> {
        if !source.is_dir() {
            return Err(Error::cache(format!(
                "source directory does not exist: {}",
                source.display()
            )));
        }

        let dest = self.entry_dir(name, version);
        let marker = self.marker_path(name, version);

        // Invalidate first so a failed copy never looks complete
        if marker.exists() {
            std::fs::remove_file(&marker)?;
        }
        if dest.exists() {
            std::fs::remove_dir_all(&dest)?;
        }
        std::fs::create_dir_all(&dest)?;

        copy_tree(source, &dest)?;
        std::fs::write(&marker, b"")?;

        debug!(name, version, ?dest, "Registered tool in cache");
        Ok(dest)
    }

    fn remove(&self, name: &str, version: &str) -> Result<()> {
        let marker = self.marker_path(name, version);
        let dir = self.entry_dir(name, version);

        // Marker first so a partial delete is already a miss
        if marker.exists() {
            std::fs::remove_file(&marker)?;
        }
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }

        debug!(name, version, ?dir, "Removed tool from cache");
        Ok(())
    }
}

/// Copy a directory tree, preserving file permissions.
fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|e| Error::cache(format!("failed to walk source: {e}")))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::cache(e.to_string()))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Normalize a version used as a cache key ("v1.2.3" -> "1.2.3").
#[must_use]
pub fn clean_version(version: &str) -> &str {
    version.trim().trim_start_matches('=').trim_start_matches('v')
}

/// Get the default tool cache directory.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("usetofu")
        .join("tools")
}
