// ============================================================================
// soundcheck-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for DetectorConfig
//
// Fluent construction of a DetectorConfig starting from the library defaults.
// The CLI starts from `DetectorConfig::from_env()` and layers its flags on
// top through `DetectorConfigBuilder::from_config`.

use std::path::PathBuf;

use super::DetectorConfig;
use crate::backend::BackendKind;
use crate::probes::ProbeKind;

/// Builder for creating DetectorConfig instances.
#[derive(Debug, Clone, Default)]
pub struct DetectorConfigBuilder {
    config: DetectorConfig,
}

impl DetectorConfigBuilder {
    /// Creates a builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder that starts from an existing configuration.
    pub fn from_config(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Sets the media backend.
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    /// Sets the probe order. An empty list disables detection entirely.
    pub fn probes(mut self, probes: Vec<ProbeKind>) -> Self {
        self.config.probes = probes;
        self
    }

    /// Sets the directory used for staged copies.
    pub fn temp_dir(mut self, dir: PathBuf) -> Self {
        self.config.temp_dir = Some(dir);
        self
    }

    /// Sets the number of seconds the ffmpeg backend decodes.
    pub fn decode_window_secs(mut self, secs: u32) -> Self {
        self.config.decode_window_secs = secs;
        self
    }

    /// Builds the configuration. Call [`DetectorConfig::validate`] before use.
    pub fn build(self) -> DetectorConfig {
        self.config
    }
}
