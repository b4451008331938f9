//! Azure Pipelines logging commands.
//!
//! The agent watches the step's stdout for `##vso[...]` lines. Only the two
//! commands a tool installer needs are emitted: `task.prependpath` to expose
//! the binary to later steps and `task.complete` for the final result.

use std::ffi::OsString;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use usetofu_core::tools::{ProcessSearchPath, SearchPath};
use usetofu_core::{Error, Result};

/// Outcome reported to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskResult {
    /// The step succeeded.
    Succeeded,
    /// The step failed.
    Failed,
}

impl TaskResult {
    /// Process exit code for this result.
    #[must_use]
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Succeeded => 0,
            Self::Failed => 1,
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("Succeeded"),
            Self::Failed => f.write_str("Failed"),
        }
    }
}

/// Writes logging commands to the agent.
pub struct LoggingCommands<W> {
    out: Mutex<W>,
}

impl<W: Write> LoggingCommands<W> {
    /// Emit commands to `out`, normally stdout.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// `##vso[task.prependpath]{dir}`
    ///
    /// # Errors
    ///
    /// Fails if the command cannot be written.
    pub fn prepend_path(&self, dir: &Path) -> io::Result<()> {
        self.emit(&format!(
            "##vso[task.prependpath]{}",
            escape_data(&dir.display().to_string())
        ))
    }

    /// `##vso[task.complete result={result};]{message}`
    ///
    /// # Errors
    ///
    /// Fails if the command cannot be written.
    pub fn complete(&self, result: TaskResult, message: &str) -> io::Result<()> {
        self.emit(&format!(
            "##vso[task.complete result={result};]{}",
            escape_data(message)
        ))
    }

    fn emit(&self, line: &str) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}")?;
        out.flush()
    }
}

/// Escape a command payload so it stays on one line.
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Search path that also tells the agent about prepended directories.
pub struct PipelineSearchPath<W> {
    inner: ProcessSearchPath,
    commands: Arc<LoggingCommands<W>>,
}

impl<W: Write> PipelineSearchPath<W> {
    /// Wrap `inner`, announcing changes through `commands`.
    pub fn new(inner: ProcessSearchPath, commands: Arc<LoggingCommands<W>>) -> Self {
        Self { inner, commands }
    }
}

impl<W: Write + Send> SearchPath for PipelineSearchPath<W> {
    fn entries(&self) -> Vec<PathBuf> {
        self.inner.entries()
    }

    fn prepend(&self, dir: &Path) -> Result<()> {
        self.inner.prepend(dir)?;
        self.commands.prepend_path(dir).map_err(Error::from)
    }

    fn to_env(&self) -> Result<OsString> {
        self.inner.to_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(commands: LoggingCommands<Vec<u8>>) -> String {
        let out = commands
            .out
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_complete_succeeded() {
        let commands = LoggingCommands::new(Vec::new());
        commands
            .complete(TaskResult::Succeeded, "OpenTofu installed successfully.")
            .unwrap();
        assert_eq!(
            written(commands),
            "##vso[task.complete result=Succeeded;]OpenTofu installed successfully.\n"
        );
    }

    #[test]
    fn test_multiline_message_is_escaped() {
        let commands = LoggingCommands::new(Vec::new());
        commands
            .complete(TaskResult::Failed, "first\nsecond 100%")
            .unwrap();
        assert_eq!(
            written(commands),
            "##vso[task.complete result=Failed;]first%0Asecond 100%AZP25\n"
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(TaskResult::Succeeded.exit_code(), 0);
        assert_eq!(TaskResult::Failed.exit_code(), 1);
    }

    #[test]
    fn test_prepend_announces_directory() {
        let commands = Arc::new(LoggingCommands::new(Vec::new()));
        let path = PipelineSearchPath::new(
            ProcessSearchPath::from_value(&std::env::join_paths(["/usr/bin"]).unwrap()),
            commands.clone(),
        );

        path.prepend(Path::new("/tools/opentofu/1.10.2/amd64")).unwrap();

        assert_eq!(
            path.entries(),
            vec![
                PathBuf::from("/tools/opentofu/1.10.2/amd64"),
                PathBuf::from("/usr/bin")
            ]
        );
        drop(path);
        let commands = Arc::try_unwrap(commands).ok().unwrap();
        assert_eq!(
            written(commands),
            "##vso[task.prependpath]/tools/opentofu/1.10.2/amd64\n"
        );
    }
}
