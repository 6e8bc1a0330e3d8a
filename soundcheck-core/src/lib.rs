//! Core library for detecting whether a video file contains audio.
//!
//! The detector stages a video as a file a decoder can open (in place for
//! files on disk, a temporary copy for bytes in memory), loads it with a
//! media backend (a native container reader, ffprobe or an ffmpeg decode) and
//! asks a list of capability probes in order until one can answer.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use soundcheck_core::{AudioPresenceDetector, DetectorConfig, VideoFile};
//! use std::path::Path;
//!
//! # async fn run() -> soundcheck_core::CoreResult<()> {
//! let config = DetectorConfig::from_env()?;
//! let detector = AudioPresenceDetector::from_config(&config)?;
//!
//! let file = VideoFile::open(Path::new("/path/to/clip.mp4"))?;
//! match detector.detect(&file).await {
//!     Ok(true) => println!("{} has audio", file.name()),
//!     Ok(false) => println!("{} is silent", file.name()),
//!     Err(e) => eprintln!("check failed: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod container;
pub mod detector;
pub mod discovery;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod media;
pub mod probes;
pub mod status;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use backend::{BackendKind, FallbackBackend, MediaBackend, build_backend};
pub use config::{DetectorConfig, DetectorConfigBuilder};
pub use container::ContainerBackend;
pub use detector::{AudioPresenceDetector, Detection};
pub use discovery::find_video_files;
pub use error::{CoreError, CoreResult, DetectionError, MediaLoadError};
pub use external::{FfmpegDecodeBackend, FfprobeBackend, check_dependency};
pub use media::{AudioTrack, LoadedMedia, VideoFile};
pub use probes::{
    AudioTrackListProbe, CapabilityProbe, DecodedAudioBytesProbe, HasAudioFlagProbe, ProbeKind,
    default_probes, probes_for,
};
pub use status::{CheckState, StatusView};
pub use temp_files::{MediaStager, StagedMedia, TempFileStager};
pub use utils::{format_bytes, format_elapsed};
