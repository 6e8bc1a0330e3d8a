// soundcheck-cli/src/lib.rs
//
// Library portion of the Soundcheck CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;

// Re-export items needed by the binary or integration tests
pub use cli::{CheckArgs, Cli, Commands, ToolsArgs};
pub use commands::check::{CheckSummary, EXIT_FAILED, run_check};
pub use commands::tools::run_tools;
