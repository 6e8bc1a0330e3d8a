// ============================================================================
// soundcheck-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Media backends built on ffprobe and ffmpeg
//
// The native container readers cover the common formats without any tools.
// When ffprobe or ffmpeg are installed they provide two more backends:
//
// - FfprobeBackend lists the streams of any container ffprobe understands
// - FfmpegDecodeBackend decodes a window of audio and counts the bytes
//
// The ffmpeg backend talks to the process through the FfmpegSpawner and
// FfmpegProcess traits so tests can substitute a scripted process.

use crate::error::{CoreError, CoreResult};

use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Audio decode backend and the ffmpeg process abstraction
pub mod ffmpeg_executor;

/// Stream listing backend using the ffprobe crate
pub mod ffprobe_executor;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_executor::{
    FfmpegDecodeBackend, FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner,
};
pub use ffprobe_executor::FfprobeBackend;

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs the command with `-version` and discards its output.
///
/// # Returns
///
/// * `Ok(Vec<String>)` - The command parts if the command is found
/// * `Err(CoreError::DependencyNotFound)` - If the command is not found
/// * `Err(CoreError::CommandStart)` - If the command exists but fails to start
pub fn check_dependency(cmd_name: &str) -> CoreResult<Vec<String>> {
    let cmd_parts = vec![cmd_name.to_string()];

    let result = Command::new(&cmd_parts[0])
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(cmd_parts)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}
