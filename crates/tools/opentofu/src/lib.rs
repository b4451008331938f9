//! OpenTofu installation for usetofu.
//!
//! Installing runs three stages in order:
//! - [`VersionResolver`] matches a specifier against the release manifest
//! - [`Installer`] selects the host's archive, downloads, extracts and caches it
//! - [`Verifier`] checks the binary, puts it on the search path and runs `tofu version`
//!
//! [`OpenTofuSetup`] wires them together. Every external effect sits behind a
//! trait so each stage can be driven with fakes.

pub mod download;
pub mod evaluate;
pub mod extract;
pub mod installer;
pub mod manifest;
pub mod resolver;
pub mod setup;
pub mod verifier;

pub use download::{Downloader, HttpDownloader};
pub use evaluate::{SemverEvaluator, VersionEvaluator};
pub use extract::{ArchiveExtractor, FsExtractor};
pub use installer::{ArchiveKind, ArchiveSelection, Installation, Installer, archive_base_name, select_archive};
pub use manifest::{HttpManifestSource, ManifestEntry, ManifestSource, VersionManifest};
pub use resolver::{LATEST_CONSTRAINT, ResolvedVersion, VersionResolver};
pub use setup::{InstalledTool, OpenTofuSetup};
pub use verifier::{CommandOutput, CommandRunner, ProcessRunner, Verifier};

use reqwest::Client;
use usetofu_core::{Error, Result};

/// HTTP client shared by the manifest source and the downloader.
///
/// # Errors
///
/// Fails if the TLS backend cannot be initialized.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(concat!("usetofu/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::configuration(format!("failed to create HTTP client: {e}")))
}
