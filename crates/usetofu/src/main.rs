//! usetofu binary

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use usetofu::cli::Cli;
use usetofu::pipeline::{LoggingCommands, PipelineSearchPath};
use usetofu::{report_outcome, tracing};
use usetofu_core::tools::ProcessSearchPath;
use usetofu_tools_opentofu::OpenTofuSetup;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = tracing::init_tracing(&cli.tracing_config()) {
        // Logging is not available yet
        #[allow(clippy::print_stderr)]
        {
            eprintln!("{e:?}");
        }
        return ExitCode::FAILURE;
    }

    let config = cli.setup_config();
    let commands = Arc::new(LoggingCommands::new(std::io::stdout()));
    let search_path = Arc::new(PipelineSearchPath::new(
        ProcessSearchPath::from_env(),
        commands.clone(),
    ));

    let outcome = match OpenTofuSetup::from_config(&config, search_path) {
        Ok(setup) => setup.run(config.specifier()).await,
        Err(e) => Err(e),
    };

    ExitCode::from(report_outcome(&commands, &outcome).exit_code())
}
