//! usetofu pipeline step
//!
//! Installs the requested OpenTofu release for the running job and reports
//! the result to the agent through pipeline logging commands.

pub mod cli;
pub mod pipeline;
pub mod tracing;

use ::tracing::{error, info};
use std::io::Write;
use usetofu_core::Result;
use usetofu_tools_opentofu::InstalledTool;

use crate::pipeline::{LoggingCommands, TaskResult};

/// Message reported when the installation succeeded.
pub const SUCCESS_MESSAGE: &str = "OpenTofu installed successfully.";

/// Message reported when the installation failed.
#[must_use]
pub fn failure_message(error: &str) -> String {
    format!("Failed to install OpenTofu: {error}")
}

/// Log the outcome of a run and report it to the agent.
pub fn report_outcome<W: Write>(
    commands: &LoggingCommands<W>,
    outcome: &Result<InstalledTool>,
) -> TaskResult {
    let (result, message) = match outcome {
        Ok(tool) => {
            info!(
                version = %tool.version,
                binary = %tool.binary.display(),
                "{SUCCESS_MESSAGE}"
            );
            (TaskResult::Succeeded, SUCCESS_MESSAGE.to_string())
        }
        Err(e) => {
            let raw = e.to_string();
            error!("{raw}");
            (TaskResult::Failed, failure_message(&raw))
        }
    };

    if let Err(e) = commands.complete(result, &message) {
        error!(error = %e, "Failed to report task result");
    }
    result
}
