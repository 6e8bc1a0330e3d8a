// ============================================================================
// soundcheck-cli/src/logging.rs
// ============================================================================
//
// LOGGING UTILITIES: Helper Functions for Logging
//
// The logger itself is log4rs, configured by
// `soundcheck_core::file_logging::setup_logging`. This module only decides
// where a run's log file goes.

use soundcheck_core::file_logging::log_file_name;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let stamp = soundcheck::logging::get_timestamp();
/// assert_eq!(stamp.len(), 15);
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Path of the log file for a run started now, inside `log_dir`.
pub fn run_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(log_file_name(&get_timestamp()))
}
