//! Host collaborators used while installing a tool.
//!
//! The installation stages never touch process-wide state directly. Instead
//! they work against three small interfaces:
//!
//! - [`HostPlatform`] - reports the OS and architecture to download for
//! - [`ToolCache`] - finds and registers installed versions
//! - [`SearchPath`] - reads and prepends the executable search path
//!
//! Production implementations ([`CurrentHost`], [`DirToolCache`],
//! [`ProcessSearchPath`]) live next to the traits; tests substitute their own.

mod cache;
mod path;
mod platform;

pub use cache::{DirToolCache, ToolCache, clean_version, default_cache_dir};
pub use path::{ProcessSearchPath, SearchPath};
pub use platform::{Arch, CurrentHost, HostPlatform, Os, Platform};
