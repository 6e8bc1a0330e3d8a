// soundcheck-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use soundcheck_core::BackendKind;
use std::path::{Path, PathBuf};

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Soundcheck: Audio presence detection for video files",
    long_about = "Checks whether video files contain an audio stream using soundcheck-core. \
                  Container headers are read natively; ffprobe and ffmpeg are used when available."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug output on the console and in the log file
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Checks video files (or directories of video files) for audio
    Check(CheckArgs),
    /// Reports which external tools are available to the detector
    Tools(ToolsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Video files or directories containing video files
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Media backend used to load each video
    #[arg(long, value_name = "BACKEND", env = "SOUNDCHECK_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Comma-separated probe order (tracks,flag,decoded)
    #[arg(long, value_name = "LIST")]
    pub probes: Option<String>,

    /// Seconds of audio the ffmpeg backend decodes
    #[arg(long = "decode-window", value_name = "SECS")]
    pub decode_window: Option<u32>,

    /// Directory for the temporary copies handed to the backend
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Print one JSON object per file instead of text
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Directory for the run's log file
    #[arg(long, value_name = "LOG_DIR", env = "SOUNDCHECK_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Do not write a log file, even when a log directory is configured
    #[arg(long, default_value_t = false)]
    pub no_log: bool,
}

impl CheckArgs {
    /// Log directory to use, if file logging is enabled.
    pub fn effective_log_dir(&self) -> Option<&Path> {
        if self.no_log { None } else { self.log_dir.as_deref() }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ToolsArgs {
    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
