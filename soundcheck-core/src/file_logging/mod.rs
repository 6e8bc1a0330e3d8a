//! Log4rs configuration for console and per-run log files.

pub mod setup;

pub use setup::{build_logging_config, log_file_name, setup_logging};
