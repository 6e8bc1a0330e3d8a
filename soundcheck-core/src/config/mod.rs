//! Configuration structures and constants for the soundcheck-core library.
//!
//! A [`DetectorConfig`] selects the media backend, the probe order, where
//! staged copies of the input are written, and how much audio the ffmpeg
//! backend decodes.

mod builder;
mod utils;

use crate::backend::BackendKind;
use crate::error::{CoreError, CoreResult};
use crate::probes::ProbeKind;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use builder::DetectorConfigBuilder;

// Default constants

/// Seconds of audio the ffmpeg backend decodes before counting bytes.
pub const DEFAULT_DECODE_WINDOW_SECS: u32 = 10;

/// Upper bound for the decode window. One hour is far more than any check needs.
pub const MAX_DECODE_WINDOW_SECS: u32 = 3600;

// Environment variables read by `DetectorConfig::from_env`.
pub const ENV_BACKEND: &str = "SOUNDCHECK_BACKEND";
pub const ENV_PROBES: &str = "SOUNDCHECK_PROBES";
pub const ENV_TEMP_DIR: &str = "SOUNDCHECK_TEMP_DIR";
pub const ENV_DECODE_WINDOW: &str = "SOUNDCHECK_DECODE_WINDOW";

/// Configuration for an [`crate::AudioPresenceDetector`].
///
/// # Examples
///
/// ```rust
/// use soundcheck_core::config::DetectorConfigBuilder;
/// use soundcheck_core::{BackendKind, ProbeKind};
///
/// let config = DetectorConfigBuilder::new()
///     .backend(BackendKind::Container)
///     .probes(vec![ProbeKind::Tracks, ProbeKind::Flag])
///     .decode_window_secs(5)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Which media backend loads the staged file
    pub backend: BackendKind,

    /// Probes asked in order; the first one that applies decides
    pub probes: Vec<ProbeKind>,

    /// Directory for staged copies (system temp dir when `None`)
    pub temp_dir: Option<PathBuf>,

    /// Seconds of audio decoded by the ffmpeg backend
    pub decode_window_secs: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            probes: ProbeKind::DEFAULT_ORDER.to_vec(),
            temp_dir: None,
            decode_window_secs: DEFAULT_DECODE_WINDOW_SECS,
        }
    }
}

impl DetectorConfig {
    /// Defaults overlaid with the `SOUNDCHECK_*` environment variables.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`, keyed by the same names
    /// as [`DetectorConfig::from_env`].
    pub fn from_lookup<L>(lookup: L) -> CoreResult<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(backend) = utils::get_env_string(&lookup, ENV_BACKEND) {
            config.backend = backend.parse()?;
        }
        if let Some(probes) = lookup(ENV_PROBES) {
            config.probes = ProbeKind::parse_list(&probes)?;
        }
        if let Some(dir) = utils::get_env_path(&lookup, ENV_TEMP_DIR) {
            config.temp_dir = Some(dir);
        }
        if let Some(secs) = utils::get_env_parsed::<_, u32>(&lookup, ENV_DECODE_WINDOW)? {
            config.decode_window_secs = secs;
        }

        log::debug!("Detector configuration: {:?}", config);
        Ok(config)
    }

    /// Checks value ranges and the staging directory.
    pub fn validate(&self) -> CoreResult<()> {
        if self.decode_window_secs == 0 || self.decode_window_secs > MAX_DECODE_WINDOW_SECS {
            return Err(CoreError::Config(format!(
                "decode window must be between 1 and {} seconds, got {}",
                MAX_DECODE_WINDOW_SECS, self.decode_window_secs
            )));
        }

        for (i, kind) in self.probes.iter().enumerate() {
            if self.probes[..i].contains(kind) {
                return Err(CoreError::Config(format!("probe '{kind}' listed more than once")));
            }
        }

        if let Some(dir) = &self.temp_dir {
            if !dir.is_dir() {
                return Err(CoreError::PathError(format!(
                    "temporary directory '{}' does not exist or is not a directory",
                    dir.display()
                )));
            }
        }

        if self.probes.is_empty() {
            log::warn!("No probes configured; every check will report that no detection method is available");
        } else if self.backend == BackendKind::Ffmpeg && !self.probes.contains(&ProbeKind::Decoded) {
            log::warn!("The ffmpeg backend only answers the 'decoded' probe, which is not configured");
        }

        Ok(())
    }
}
