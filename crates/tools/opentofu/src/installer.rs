//! Archive selection, download and cache registration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use usetofu_core::tools::{Arch, HostPlatform, Os, ToolCache};
use usetofu_core::{Error, Result, TOOL_NAME};

use crate::download::Downloader;
use crate::extract::ArchiveExtractor;

/// Archive formats published for OpenTofu releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// `.zip`
    Zip,
    /// `.tar.gz`
    TarGz,
}

impl ArchiveKind {
    /// Classify a file name by suffix. Anything but `.zip` is treated as a tarball.
    #[must_use]
    pub fn from_file_name(name: &str) -> Self {
        if name.ends_with(".zip") {
            Self::Zip
        } else {
            Self::TarGz
        }
    }
}

/// The archive chosen for this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSelection {
    /// File name, always a member of the manifest's file list.
    pub file_name: String,
    /// Extraction format.
    pub kind: ArchiveKind,
}

/// Where an installed release lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    /// Cached tool directory.
    pub directory: PathBuf,
    /// `true` when this call downloaded the release, `false` on a cache hit.
    pub downloaded: bool,
}

/// Archive base name for a release, e.g. `tofu_1.10.2_linux_amd64`.
#[must_use]
pub fn archive_base_name(version: &str, os: Os, arch: Arch) -> String {
    format!("tofu_{version}_{os}_{arch}")
}

/// Choose the archive to download from the published `files`.
///
/// Windows only accepts `.zip`. Elsewhere `.tar.gz` wins over `.zip`
/// regardless of the order of `files`.
///
/// # Errors
///
/// Returns [`Error::NoMatchingArchive`] when no acceptable name is listed.
pub fn select_archive(
    version: &str,
    files: &[String],
    os: Os,
    arch: Arch,
) -> Result<ArchiveSelection> {
    let base = archive_base_name(version, os, arch);
    let zip = format!("{base}.zip");
    let tar_gz = format!("{base}.tar.gz");

    let candidates = if os.is_windows() {
        vec![zip]
    } else {
        vec![tar_gz, zip]
    };

    candidates
        .into_iter()
        .find(|candidate| files.contains(candidate))
        .map(|file_name| ArchiveSelection {
            kind: ArchiveKind::from_file_name(&file_name),
            file_name,
        })
        .ok_or_else(|| Error::no_matching_archive(os.as_str(), arch.as_str()))
}

/// Installs a resolved release into the tool cache.
pub struct Installer {
    cache: Arc<dyn ToolCache>,
    downloader: Arc<dyn Downloader>,
    extractor: Arc<dyn ArchiveExtractor>,
    host: Arc<dyn HostPlatform>,
    release_url: String,
    work_dir: PathBuf,
}

impl Installer {
    /// Create an installer.
    ///
    /// Downloads and extraction happen in fresh subdirectories of `work_dir`.
    #[must_use]
    pub fn new(
        cache: Arc<dyn ToolCache>,
        downloader: Arc<dyn Downloader>,
        extractor: Arc<dyn ArchiveExtractor>,
        host: Arc<dyn HostPlatform>,
        release_url: impl Into<String>,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            cache,
            downloader,
            extractor,
            host,
            release_url: release_url.into(),
            work_dir,
        }
    }

    /// Release download URL for an archive.
    #[must_use]
    pub fn download_url(&self, version: &str, file_name: &str) -> String {
        format!(
            "{}/v{version}/{file_name}",
            self.release_url.trim_end_matches('/')
        )
    }

    /// Make `version` available locally.
    ///
    /// A cached entry is returned as is. Otherwise the matching archive is
    /// downloaded, extracted and registered under the cache.
    ///
    /// # Errors
    ///
    /// [`Error::NoMatchingArchive`], [`Error::Download`], [`Error::Extraction`],
    /// or a cache registration failure. Nothing is registered on failure.
    pub async fn install(&self, version: &str, files: &[String]) -> Result<Installation> {
        if let Some(cached) = self.cache.find(TOOL_NAME, version) {
            debug!(version, path = %cached.display(), "Using cached OpenTofu");
            return Ok(Installation {
                directory: cached,
                downloaded: false,
            });
        }

        let os = self.host.os()?;
        let arch = self.host.arch()?;
        let selection = select_archive(version, files, os, arch)?;
        let url = self.download_url(version, &selection.file_name);

        let work = self.work_dir.join(uuid::Uuid::new_v4().to_string());
        let result = self.fetch_and_register(version, &selection, &url, &work).await;

        if let Err(e) = tokio::fs::remove_dir_all(&work).await {
            debug!(dir = %work.display(), error = %e, "Could not clean work directory");
        }

        result.map(|directory| Installation {
            directory,
            downloaded: true,
        })
    }

    /// Drop the cache entry for `version`.
    ///
    /// # Errors
    ///
    /// Fails if the entry cannot be deleted.
    pub fn discard(&self, version: &str) -> Result<()> {
        self.cache.remove(TOOL_NAME, version)
    }

    async fn fetch_and_register(
        &self,
        version: &str,
        selection: &ArchiveSelection,
        url: &str,
        work: &Path,
    ) -> Result<PathBuf> {
        info!(version, archive = %selection.file_name, "Downloading OpenTofu");
        let archive = work.join(&selection.file_name);
        self.downloader.download(url, &archive).await?;

        let dest = work.join("extract");
        let extracted = match selection.kind {
            ArchiveKind::Zip => self.extractor.extract_zip(&archive, &dest).await?,
            ArchiveKind::TarGz => self.extractor.extract_tar(&archive, &dest).await?,
        };

        let cached = self.cache.register(&extracted, TOOL_NAME, version)?;
        info!(version, path = %cached.display(), "Cached OpenTofu");
        Ok(cached)
    }
}
