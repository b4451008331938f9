//! Command line and pipeline inputs.

use clap::Parser;
use std::path::PathBuf;
use usetofu_core::config::{DEFAULT_MANIFEST_URL, DEFAULT_RELEASE_URL, SetupConfig};
use usetofu_core::retry::DEFAULT_MAX_ATTEMPTS;

use crate::tracing::{LogLevel, TracingConfig, TracingFormat};

/// Tool cache variable set by GitHub-style runners, used when the Azure one is absent.
pub const RUNNER_TOOL_CACHE: &str = "RUNNER_TOOL_CACHE";

#[derive(Parser, Debug)]
#[command(name = "usetofu")]
#[command(about = "Install OpenTofu for the current pipeline job")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(
        long = "tofu-version",
        env = "INPUT_VERSION",
        value_name = "SPEC",
        help = "Version to install: 'latest', an exact version or a range"
    )]
    pub tofu_version: Option<String>,

    #[arg(
        long,
        env = "USETOFU_MANIFEST_URL",
        default_value = DEFAULT_MANIFEST_URL,
        help = "OpenTofu version manifest URL"
    )]
    pub manifest_url: String,

    #[arg(
        long,
        env = "USETOFU_RELEASE_URL",
        default_value = DEFAULT_RELEASE_URL,
        help = "Base URL of release downloads"
    )]
    pub release_url: String,

    #[arg(
        long,
        env = "AGENT_TOOLSDIRECTORY",
        value_name = "DIR",
        help = "Tool cache root"
    )]
    pub tool_cache: Option<PathBuf>,

    #[arg(
        long,
        env = "AGENT_TEMPDIRECTORY",
        value_name = "DIR",
        help = "Scratch directory for downloads"
    )]
    pub temp_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "USETOFU_DOWNLOAD_ATTEMPTS",
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Attempts per archive download"
    )]
    pub download_attempts: u32,

    #[arg(
        short = 'l',
        long,
        help = "Set logging level",
        default_value = "info",
        value_enum
    )]
    pub log_level: LogLevel,

    #[arg(long, help = "Log output format", default_value = "pretty", value_enum)]
    pub log_format: TracingFormat,
}

impl Cli {
    /// Settings for the setup run.
    #[must_use]
    pub fn setup_config(&self) -> SetupConfig {
        let mut config = SetupConfig::new()
            .with_version(self.tofu_version.clone().unwrap_or_default())
            .with_manifest_url(self.manifest_url.clone())
            .with_release_url(self.release_url.clone())
            .with_download_attempts(self.download_attempts);

        let tool_cache = self.tool_cache.clone().or_else(|| {
            std::env::var_os(RUNNER_TOOL_CACHE)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        });
        if let Some(dir) = tool_cache {
            config = config.with_tool_cache(dir);
        }
        if let Some(dir) = self.temp_dir.clone() {
            config = config.with_temp_dir(dir);
        }

        config
    }

    /// Settings for the log subscriber.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        TracingConfig {
            format: self.log_format,
            level: self.log_level.into(),
        }
    }
}
