//! Post-install checks of the `tofu` binary.

use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use usetofu_core::tools::{HostPlatform, SearchPath};
use usetofu_core::{Error, Result};

/// Captured result of a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited successfully.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

/// Launches programs.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and `PATH` set to `path_env`, waiting for it to exit.
    ///
    /// # Errors
    ///
    /// Fails when the program cannot be launched.
    async fn run(&self, program: &Path, args: &[&str], path_env: &OsStr) -> Result<CommandOutput>;
}

/// Runs programs as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &Path, args: &[&str], path_env: &OsStr) -> Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .env("PATH", path_env)
            .output()
            .await
            .map_err(|e| Error::execution(program, e.to_string()))?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Makes an installed binary usable and smoke tests it.
pub struct Verifier {
    host: Arc<dyn HostPlatform>,
    search_path: Arc<dyn SearchPath>,
    runner: Arc<dyn CommandRunner>,
}

impl Verifier {
    /// Create a verifier.
    #[must_use]
    pub fn new(
        host: Arc<dyn HostPlatform>,
        search_path: Arc<dyn SearchPath>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            host,
            search_path,
            runner,
        }
    }

    /// Expected binary location inside an installed directory.
    ///
    /// # Errors
    ///
    /// Fails when the host OS is unsupported.
    pub fn binary_path(&self, tool_dir: &Path) -> Result<PathBuf> {
        let ext = self.host.os()?.executable_extension();
        Ok(tool_dir.join(format!("tofu{ext}")))
    }

    /// Check the binary in `tool_dir`, put it on the search path and run
    /// `tofu version`. Returns the binary path.
    ///
    /// # Errors
    ///
    /// [`Error::ToolNotFound`] if the binary is missing, in which case nothing
    /// is changed. [`Error::Execution`] if the smoke test fails.
    pub async fn verify(&self, tool_dir: &Path) -> Result<PathBuf> {
        let binary = self.binary_path(tool_dir)?;
        if !binary.is_file() {
            return Err(Error::tool_not_found(binary));
        }

        make_executable(&binary)?;

        let bin_dir = binary.parent().unwrap_or(tool_dir);
        if self.search_path.entries().first().map(PathBuf::as_path) == Some(bin_dir) {
            debug!(dir = %bin_dir.display(), "Already first on search path");
        } else {
            self.search_path.prepend(bin_dir)?;
        }

        let path_env = self.search_path.to_env()?;
        let output = self.runner.run(&binary, &["version"], &path_env).await?;
        if !output.success {
            let status = output
                .code
                .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"));
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                status
            } else {
                format!("{status}: {stderr}")
            };
            return Err(Error::execution(&binary, message));
        }

        debug!(output = %output.stdout.trim(), "tofu version");
        info!(binary = %binary.display(), "Verified OpenTofu");
        Ok(binary)
    }
}

#[cfg(unix)]
fn make_executable(binary: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(binary, std::fs::Permissions::from_mode(0o777))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_binary: &Path) -> Result<()> {
    Ok(())
}
