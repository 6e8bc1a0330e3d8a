// soundcheck-cli/src/main.rs
//
// Entry point for the Soundcheck command-line tool.
//
// Responsibilities:
// - Parsing command-line arguments (`Cli`).
// - Setting up log4rs console logging and the optional per-run log file.
// - Dispatching to the `check` and `tools` commands.
// - Mapping the outcome to the process exit code: 0 when every file has
//   audio, 1 when some file has none, 2 when a check or the run failed.

use clap::Parser;
use soundcheck::logging::run_log_path;
use soundcheck::output::print_error;
use soundcheck::{Cli, Commands, EXIT_FAILED, run_check, run_tools};
use soundcheck_core::file_logging::setup_logging;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Check(args) => args.effective_log_dir().map(run_log_path),
        Commands::Tools(_) => None,
    };
    match setup_logging(log_file.as_deref(), cli.verbose) {
        Ok(()) => {
            if let Some(path) = &log_file {
                log::debug!("Logging to {}", path.display());
            }
        }
        Err(e) => print_error(&format!("Failed to set up logging: {e:#}")),
    }

    let exit_code = match cli.command {
        Commands::Check(args) => match run_check(&args, cli.verbose).await {
            Ok(summary) => summary.exit_code(),
            Err(e) => {
                log::error!("Check failed: {}", e);
                print_error(&e.to_string());
                EXIT_FAILED
            }
        },
        Commands::Tools(args) => match run_tools(&args) {
            Ok(()) => 0,
            Err(e) => {
                print_error(&e.to_string());
                EXIT_FAILED
            }
        },
    };

    process::exit(exit_code);
}
