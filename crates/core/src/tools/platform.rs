//! Host platform identification.
//!
//! OpenTofu release archives are named `tofu_{version}_{os}_{arch}`, so the
//! host has to be mapped onto the release naming scheme:
//! - `linux`, `windows`, `darwin`
//! - `amd64`, `arm64`, `386`

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Platform identifier combining OS and architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl Platform {
    /// Create a new platform.
    #[must_use]
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the platform this process runs on.
    ///
    /// # Errors
    ///
    /// Fails when the OS or the architecture has no OpenTofu build.
    pub fn current() -> Result<Self> {
        Ok(Self {
            os: Os::current()?,
            arch: Arch::current()?,
        })
    }

    /// Parse from string like "linux-amd64".
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (os, arch) = s.split_once('-')?;
        Some(Self {
            os: Os::parse(os)?,
            arch: Arch::parse(arch)?,
        })
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Linux.
    Linux,
    /// Windows.
    Windows,
    /// macOS.
    Darwin,
}

impl Os {
    /// Get the current OS.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOs`] outside Linux, Windows and macOS.
    pub fn current() -> Result<Self> {
        Self::from_rust_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value.
    fn from_rust_os(os: &str) -> Result<Self> {
        match os {
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::Darwin),
            other => Err(Error::UnsupportedOs {
                os: other.to_string(),
            }),
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "windows" | "win32" => Some(Self::Windows),
            "darwin" | "macos" => Some(Self::Darwin),
            _ => None,
        }
    }

    /// Name used in release archive file names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Darwin => "darwin",
        }
    }

    /// Returns `.exe` on Windows, empty string elsewhere.
    #[must_use]
    pub fn executable_extension(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Linux | Self::Darwin => "",
        }
    }

    /// Whether this is Windows.
    #[must_use]
    pub fn is_windows(self) -> bool {
        matches!(self, Self::Windows)
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit x86.
    Amd64,
    /// 64-bit ARM.
    Arm64,
    /// 32-bit x86, published as `386`.
    #[serde(rename = "386")]
    X86,
}

impl Arch {
    /// Get the current architecture.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedArch`] outside x86, x86_64 and aarch64.
    pub fn current() -> Result<Self> {
        Self::from_rust_arch(std::env::consts::ARCH)
    }

    /// Map a `std::env::consts::ARCH` value.
    fn from_rust_arch(arch: &str) -> Result<Self> {
        match arch {
            "x86_64" => Ok(Self::Amd64),
            "aarch64" => Ok(Self::Arm64),
            "x86" => Ok(Self::X86),
            other => Err(Error::UnsupportedArch {
                arch: other.to_string(),
            }),
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "amd64" | "x86_64" | "x64" => Some(Self::Amd64),
            "arm64" | "aarch64" => Some(Self::Arm64),
            "386" | "x86" | "ia32" | "i686" => Some(Self::X86),
            _ => None,
        }
    }

    /// Name used in release archive file names.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::X86 => "386",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability to report the host operating system and architecture.
///
/// Stages ask this instead of reading `std::env::consts` so that archive
/// selection and binary naming stay table-driven in tests.
pub trait HostPlatform: Send + Sync {
    /// Operating system of the host.
    ///
    /// # Errors
    ///
    /// Fails when the host OS is unsupported.
    fn os(&self) -> Result<Os>;

    /// Architecture of the host.
    ///
    /// # Errors
    ///
    /// Fails when the host architecture is unsupported.
    fn arch(&self) -> Result<Arch>;
}

/// The platform of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentHost;

impl HostPlatform for CurrentHost {
    fn os(&self) -> Result<Os> {
        Os::current()
    }

    fn arch(&self) -> Result<Arch> {
        Arch::current()
    }
}

/// A fixed platform, for hosts known ahead of time.
impl HostPlatform for Platform {
    fn os(&self) -> Result<Os> {
        Ok(self.os)
    }

    fn arch(&self) -> Result<Arch> {
        Ok(self.arch)
    }
}
