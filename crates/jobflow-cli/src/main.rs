//! jobflow CLI: command-line dashboard for the jobflow API.
//!
//! Set JOBFLOW_API_URL (or API_URL) to point at the backend; `jobflow login`
//! stores a bearer token under JOBFLOW_SESSION_DIR for later commands.

use std::process::ExitCode;

use clap::Parser;
use jobflow_cli::cli::Cli;
use jobflow_cli::{commands, init_tracing};
use jobflow_core::{find_api_error, LogLevel};
use tracing::{error, warn};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match find_api_error(&e) {
                Some(api_error) => {
                    match api_error.log_level() {
                        LogLevel::Error => error!(error = %api_error, "Command failed"),
                        LogLevel::Warn => warn!(error = %api_error, "Command failed"),
                        _ => {}
                    }
                    eprintln!("Error: {}", api_error.client_message());
                }
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}
