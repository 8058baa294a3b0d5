use clap::Parser;
use std::process::ExitCode;

mod commands;
mod logging;
mod output;
pub mod ux_error;

use commands::{Cli, Commands};
use ux_error::UxError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Only the export writes a log file. Resolution errors surface again
    // from the command once the console logger is up.
    let file_logging = match &cli.command {
        Commands::Export(args) => commands::resolve_config(&args.source)
            .ok()
            .map(|config| config.logging),
        Commands::Config(_) => None
    };
    let _log_guard = logging::init(cli.log_level.as_deref(), file_logging.as_ref());
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting genesys-export");

    let result = match cli.command {
        Commands::Export(args) => commands::export::run(args).await,
        Commands::Config(args) => commands::settings::run(args)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<UxError>() {
                Some(ux) => ux.display(),
                None => output::error(&format!("{:#}", e))
            }
            ExitCode::FAILURE
        }
    }
}
