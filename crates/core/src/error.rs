//! Error types for a usetofu setup run.
//!
//! Every failure of a run is terminal. The variants follow the stage that
//! raises them: version resolution, installation, then verification.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for usetofu operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, installing or verifying OpenTofu.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The version manifest could not be requested.
    #[error("Failed to fetch OpenTofu version API: {message}")]
    #[diagnostic(code(usetofu::version_fetch))]
    VersionFetch {
        /// Underlying transport error.
        message: String,
    },

    /// The version manifest answered with a non-success status.
    #[error("OpenTofu version API returned status {status}: {status_text}")]
    #[diagnostic(code(usetofu::version_fetch))]
    VersionStatus {
        /// Numeric HTTP status.
        status: u16,
        /// Canonical reason phrase for the status.
        status_text: String,
    },

    /// The version manifest body did not have the expected structure.
    #[error("Failed to parse OpenTofu version API response: {message}")]
    #[diagnostic(code(usetofu::version_parse))]
    VersionParse {
        /// Underlying decode error.
        message: String,
    },

    /// No manifest version satisfies the requested specifier.
    #[error("OpenTofu version '{requested}' could not be found")]
    #[diagnostic(
        code(usetofu::version_not_found),
        help("Use 'latest', an exact version such as 1.9.0, or a range such as '>=1.8.0 <1.9.0'")
    )]
    VersionNotFound {
        /// The specifier as supplied by the user.
        requested: String,
    },

    /// The manifest lists no archive for the host platform.
    #[error("No OpenTofu archive is available for {platform}/{arch}")]
    #[diagnostic(code(usetofu::no_matching_archive))]
    NoMatchingArchive {
        /// Platform component of the archive name.
        platform: String,
        /// Architecture component of the archive name.
        arch: String,
    },

    /// A single HTTP transfer failed. Wrapped into [`Error::Download`] once
    /// retries are exhausted.
    #[error("HTTP request to {url} failed: {message}")]
    #[diagnostic(code(usetofu::http))]
    Http {
        /// Requested URL.
        url: String,
        /// Response status, when a response was received.
        status: Option<u16>,
        /// Error description.
        message: String,
    },

    /// The release archive could not be downloaded.
    #[error("Failed to download {url} after {attempts} attempt(s): {message}")]
    #[diagnostic(code(usetofu::download))]
    Download {
        /// Archive URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Last error seen.
        message: String,
    },

    /// The downloaded archive could not be unpacked.
    #[error("Failed to extract {}: {message}", archive.display())]
    #[diagnostic(code(usetofu::extraction))]
    Extraction {
        /// Archive on disk.
        archive: PathBuf,
        /// Error description.
        message: String,
    },

    /// The extracted directory has no `tofu` binary.
    #[error("OpenTofu binary not found at {}", path.display())]
    #[diagnostic(code(usetofu::tool_not_found))]
    ToolNotFound {
        /// Expected binary path.
        path: PathBuf,
    },

    /// The smoke test of the installed binary failed.
    #[error("Failed to execute {}: {message}", program.display())]
    #[diagnostic(code(usetofu::execution))]
    Execution {
        /// Program that was launched.
        program: PathBuf,
        /// Launch error or exit status description.
        message: String,
    },

    /// The host operating system has no OpenTofu build.
    #[error("Unsupported operating system: {os}")]
    #[diagnostic(code(usetofu::unsupported_os))]
    UnsupportedOs {
        /// Operating system as reported by the host.
        os: String,
    },

    /// The host architecture has no OpenTofu build.
    #[error("Unsupported architecture: {arch}")]
    #[diagnostic(code(usetofu::unsupported_arch))]
    UnsupportedArch {
        /// Architecture as reported by the host.
        arch: String,
    },

    /// Tool cache lookup or registration failed.
    #[error("Tool cache error: {message}")]
    #[diagnostic(code(usetofu::cache))]
    Cache {
        /// Error description.
        message: String,
    },

    /// Invalid runtime configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(usetofu::configuration))]
    Configuration {
        /// Error description.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    #[diagnostic(code(usetofu::io))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a version fetch error from a transport failure.
    #[must_use]
    pub fn version_fetch(message: impl Into<String>) -> Self {
        Self::VersionFetch {
            message: message.into(),
        }
    }

    /// Create a version fetch error from a non-success status.
    #[must_use]
    pub fn version_status(status: u16, status_text: impl Into<String>) -> Self {
        Self::VersionStatus {
            status,
            status_text: status_text.into(),
        }
    }

    /// Create a version parse error.
    #[must_use]
    pub fn version_parse(message: impl Into<String>) -> Self {
        Self::VersionParse {
            message: message.into(),
        }
    }

    /// Create a version not found error.
    #[must_use]
    pub fn version_not_found(requested: impl Into<String>) -> Self {
        Self::VersionNotFound {
            requested: requested.into(),
        }
    }

    /// Create a no matching archive error.
    #[must_use]
    pub fn no_matching_archive(platform: impl Into<String>, arch: impl Into<String>) -> Self {
        Self::NoMatchingArchive {
            platform: platform.into(),
            arch: arch.into(),
        }
    }

    /// Create an HTTP transfer error.
    #[must_use]
    pub fn http(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a download error.
    #[must_use]
    pub fn download(url: impl Into<String>, attempts: u32, message: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            attempts,
            message: message.into(),
        }
    }

    /// Create an extraction error.
    #[must_use]
    pub fn extraction(archive: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Extraction {
            archive: archive.into(),
            message: message.into(),
        }
    }

    /// Create a tool not found error.
    #[must_use]
    pub fn tool_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ToolNotFound { path: path.into() }
    }

    /// Create an execution error.
    #[must_use]
    pub fn execution(program: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Execution {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Create a tool cache error.
    #[must_use]
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether a failed transfer is worth another attempt.
    ///
    /// Connection failures, timeouts, 408, 429 and server errors are
    /// transient. Any other client error is final.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status: None, .. } | Self::Io(_) => true,
            Self::Http {
                status: Some(status),
                ..
            } => matches!(status, 408 | 429 | 500..=599),
            _ => false,
        }
    }
}
