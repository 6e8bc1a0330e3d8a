use anyhow::Result;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use std::path::Path;

/// Pattern used for log files.
pub const FILE_LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";

/// Pattern used on the console. Timestamps only add noise there.
pub const CONSOLE_LOG_PATTERN: &str = "[{h({l})}] {m}{n}";

/// Name of the log file for a run started at `timestamp`.
pub fn log_file_name(timestamp: &str) -> String {
    format!("soundcheck_check_run_{timestamp}.log")
}

/// Builds the log4rs configuration without installing it.
///
/// The console appender writes to stderr so stdout stays clean for results.
/// It shows warnings and errors, or everything at `Debug` when `verbose`.
/// The optional file appender records `Info` and up, or `Debug` when
/// `verbose`.
pub fn build_logging_config(log_file: Option<&Path>, verbose: bool) -> Result<Config> {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let console_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(CONSOLE_LOG_PATTERN)))
        .build();

    let mut builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(console_level)))
            .build("console", Box::new(console)),
    );
    let mut root = Root::builder().appender("console");

    if let Some(log_file) = log_file {
        // Create log directory if it doesn't exist
        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file_appender = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(FILE_LOG_PATTERN)))
            .build(log_file)?;
        builder = builder.appender(Appender::builder().build("file", Box::new(file_appender)));
        root = root.appender("file");
    }

    Ok(builder.build(root.build(level))?)
}

/// Installs the global logger. Fails if a logger is already installed.
pub fn setup_logging(log_file: Option<&Path>, verbose: bool) -> Result<()> {
    let config = build_logging_config(log_file, verbose)?;
    log4rs::init_config(config)?;
    Ok(())
}
