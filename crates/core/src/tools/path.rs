//! Executable search path of the running step.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::{Error, Result};

/// Ordered list of directories searched for executables.
pub trait SearchPath: Send + Sync {
    /// Current entries, first entry searched first.
    fn entries(&self) -> Vec<PathBuf>;

    /// Put `dir` in front of all other entries.
    ///
    /// # Errors
    ///
    /// Fails if the change cannot be recorded by the host.
    fn prepend(&self, dir: &Path) -> Result<()>;

    /// Render the entries as a `PATH` value for child processes.
    ///
    /// # Errors
    ///
    /// Fails if an entry contains the platform path separator.
    fn to_env(&self) -> Result<OsString> {
        std::env::join_paths(self.entries())
            .map_err(|e| Error::configuration(format!("invalid search path entry: {e}")))
    }
}

/// In-process copy of `PATH`.
///
/// The process environment itself is never mutated. Children launched by
/// usetofu receive [`SearchPath::to_env`] explicitly.
#[derive(Debug, Default)]
pub struct ProcessSearchPath {
    entries: Mutex<Vec<PathBuf>>,
}

impl ProcessSearchPath {
    /// Snapshot the `PATH` of the current process.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var_os("PATH").map_or_else(Self::default, |value| Self::from_value(&value))
    }

    /// Build from a `PATH`-formatted value.
    #[must_use]
    pub fn from_value(value: &OsStr) -> Self {
        let entries = std::env::split_paths(value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl SearchPath for ProcessSearchPath {
    fn entries(&self) -> Vec<PathBuf> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn prepend(&self, dir: &Path) -> Result<()> {
        debug!(dir = %dir.display(), "Prepending to search path");
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, dir.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(parts: &[&str]) -> OsString {
        std::env::join_paths(parts).unwrap()
    }

    #[test]
    fn test_from_value_preserves_order() {
        let path = ProcessSearchPath::from_value(&joined(&["/usr/local/bin", "/usr/bin"]));
        assert_eq!(
            path.entries(),
            vec![PathBuf::from("/usr/local/bin"), PathBuf::from("/usr/bin")]
        );
    }

    #[test]
    fn test_prepend_puts_dir_first() {
        let path = ProcessSearchPath::from_value(&joined(&["/usr/bin"]));
        path.prepend(Path::new("/opt/tofu")).unwrap();

        assert_eq!(path.entries()[0], PathBuf::from("/opt/tofu"));
        assert_eq!(path.entries().len(), 2);
        assert_eq!(path.to_env().unwrap(), joined(&["/opt/tofu", "/usr/bin"]));
    }

    #[test]
    fn test_empty_segments_are_dropped() {
        let path = ProcessSearchPath::from_value(OsStr::new(""));
        assert!(path.entries().is_empty());
    }

    #[test]
    fn test_from_env_reads_path() {
        temp_env::with_var("PATH", Some(joined(&["/a", "/b"])), || {
            let path = ProcessSearchPath::from_env();
            assert_eq!(path.entries(), vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        });
    }

    #[test]
    fn test_from_env_without_path() {
        temp_env::with_var_unset("PATH", || {
            assert!(ProcessSearchPath::from_env().entries().is_empty());
        });
    }
}
