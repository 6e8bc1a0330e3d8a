//! Error types for the soundcheck-core library.
//!
//! Detection itself only ever fails in two ways, both carried by
//! [`DetectionError`]. The underlying reason a file could not be loaded is a
//! [`MediaLoadError`] attached as the error source. Everything around the
//! detector (configuration, file discovery, opening inputs) reports a
//! [`CoreError`].

use std::io;
use std::process::ExitStatus;
use thiserror::Error;

/// Why a video could not be opened or decoded by a media backend.
#[derive(Error, Debug)]
pub enum MediaLoadError {
    #[error("failed to stage media for decoding: {0}")]
    Staging(#[source] io::Error),

    #[error("I/O error while reading the container: {0}")]
    Io(#[from] io::Error),

    #[error("unrecognized container format")]
    UnsupportedFormat,

    #[error("malformed {container} container: {reason}")]
    Malformed {
        container: &'static str,
        reason: String,
    },

    #[error("failed to start {tool}: {source}")]
    ToolStart {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} could not read the media ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("unexpected {tool} output: {message}")]
    ToolOutput { tool: String, message: String },

    #[error("decoder task aborted: {0}")]
    Aborted(String),
}

impl MediaLoadError {
    /// Shorthand for a [`MediaLoadError::Malformed`] error.
    pub fn malformed(container: &'static str, reason: impl Into<String>) -> Self {
        MediaLoadError::Malformed {
            container,
            reason: reason.into(),
        }
    }
}

/// The two ways an audio presence check can fail.
///
/// `NoDetectionMethodAvailable` is deliberately distinct from `Ok(false)`:
/// it means the verdict is unknown, not that the video is silent.
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("failed to load video '{file}': {source}")]
    LoadError {
        file: String,
        #[source]
        source: MediaLoadError,
    },

    #[error("no audio detection method is available for '{file}' (backend: {backend})")]
    NoDetectionMethodAvailable { file: String, backend: String },
}

impl DetectionError {
    /// Name of the file the failed check was about.
    pub fn file(&self) -> &str {
        match self {
            DetectionError::LoadError { file, .. } => file,
            DetectionError::NoDetectionMethodAvailable { file, .. } => file,
        }
    }
}

/// Errors raised by the library outside of a single detection.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("No video files found in the input directory")]
    NoFilesFound,

    #[error("'{0}' is not a video file")]
    NotAVideo(String),

    #[error("Required tool '{0}' was not found")]
    DependencyNotFound(String),

    #[error("Failed to start '{0}': {1}")]
    CommandStart(String, #[source] io::Error),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type alias used throughout the library.
pub type CoreResult<T> = Result<T, CoreError>;

/// Builds a [`MediaLoadError::ToolStart`] for an external tool.
pub fn command_start_error(tool: impl Into<String>, source: io::Error) -> MediaLoadError {
    MediaLoadError::ToolStart {
        tool: tool.into(),
        source,
    }
}

/// Builds a [`MediaLoadError::ToolFailed`] for an external tool.
pub fn command_failed_error(
    tool: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> MediaLoadError {
    MediaLoadError::ToolFailed {
        tool: tool.into(),
        status,
        stderr: stderr.into(),
    }
}
