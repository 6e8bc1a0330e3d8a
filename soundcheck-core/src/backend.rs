//! Media backends: the environments that load a staged video and report
//! which audio-presence primitives they can answer.
//!
//! A backend is blocking. The detector runs it on tokio's blocking pool so a
//! detection still suspends exactly once from the caller's point of view.

use crate::config::DetectorConfig;
use crate::container::ContainerBackend;
use crate::error::{CoreError, CoreResult, MediaLoadError};
use crate::external::{self, FfmpegDecodeBackend, FfprobeBackend};
use crate::media::LoadedMedia;
use crate::temp_files::StagedMedia;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A decoding environment able to load container metadata.
pub trait MediaBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Loads the staged media and returns its capability surface.
    fn load(&self, media: &StagedMedia) -> Result<LoadedMedia, MediaLoadError>;
}

/// Backend selection, as named in configuration and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Native container reader, then ffprobe when it is installed
    #[default]
    Auto,
    /// Native container reader only
    Container,
    /// ffprobe stream listing
    Ffprobe,
    /// ffmpeg audio decode byte count
    Ffmpeg,
}

impl BackendKind {
    pub const ALL: [BackendKind; 4] = [
        BackendKind::Auto,
        BackendKind::Container,
        BackendKind::Ffprobe,
        BackendKind::Ffmpeg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Auto => "auto",
            BackendKind::Container => "container",
            BackendKind::Ffprobe => "ffprobe",
            BackendKind::Ffmpeg => "ffmpeg",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CoreError::Config(format!(
                    "unknown backend '{s}' (expected one of: auto, container, ffprobe, ffmpeg)"
                ))
            })
    }
}

/// Tries backends in order, moving on only when a backend does not recognize
/// the container. Any other load failure is final.
pub struct FallbackBackend {
    backends: Vec<Arc<dyn MediaBackend>>,
}

impl FallbackBackend {
    pub fn new(backends: Vec<Arc<dyn MediaBackend>>) -> Self {
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }
}

impl MediaBackend for FallbackBackend {
    fn name(&self) -> &'static str {
        "auto"
    }

    fn load(&self, media: &StagedMedia) -> Result<LoadedMedia, MediaLoadError> {
        for backend in &self.backends {
            match backend.load(media) {
                Err(MediaLoadError::UnsupportedFormat) => {
                    log::debug!(
                        "Backend '{}' does not recognize {}, trying next",
                        backend.name(),
                        media.path().display()
                    );
                }
                result => return result,
            }
        }
        Err(MediaLoadError::UnsupportedFormat)
    }
}

/// Builds the backend described by the configuration.
pub fn build_backend(config: &DetectorConfig) -> CoreResult<Arc<dyn MediaBackend>> {
    let backend: Arc<dyn MediaBackend> = match config.backend {
        BackendKind::Container => Arc::new(ContainerBackend::new()),
        BackendKind::Ffprobe => {
            external::check_dependency("ffprobe")?;
            Arc::new(FfprobeBackend::new())
        }
        BackendKind::Ffmpeg => {
            external::check_dependency("ffmpeg")?;
            Arc::new(FfmpegDecodeBackend::new(config.decode_window_secs))
        }
        BackendKind::Auto => {
            let mut chain: Vec<Arc<dyn MediaBackend>> = Vec::new();
            chain.push(Arc::new(ContainerBackend::new()));
            if external::check_dependency("ffprobe").is_ok() {
                chain.push(Arc::new(FfprobeBackend::new()));
            } else {
                log::debug!("ffprobe not available, auto backend uses the container reader only");
            }
            Arc::new(FallbackBackend::new(chain))
        }
    };
    log::debug!("Using '{}' media backend", backend.name());
    Ok(backend)
}
