// ============================================================================
// soundcheck-core/src/detector.rs
// ============================================================================
//
// AUDIO PRESENCE DETECTOR: Deciding whether a video carries audio
//
// A detection stages the video as a file on disk, loads it with the
// configured media backend and asks the capability probes in order. The first
// probe that applies decides. When none applies the verdict is unknown and the
// detection fails with `NoDetectionMethodAvailable` instead of guessing.
//
// Staging, loading and probing run together as one task on tokio's blocking
// pool. The task owns the staged file, so it is released exactly once whether
// the task returns a verdict, returns an error or panics.

use crate::backend::{self, MediaBackend};
use crate::config::DetectorConfig;
use crate::error::{CoreResult, DetectionError, MediaLoadError};
use crate::media::{LoadedMedia, VideoFile};
use crate::probes::{self, CapabilityProbe};
use crate::temp_files::{MediaStager, TempFileStager};

use futures::future::join_all;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Outcome of a successful check, with how the verdict was reached.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    /// Name of the checked file
    pub file: String,
    /// Whether the video contains audio
    pub has_audio: bool,
    /// Name of the probe that produced the verdict
    pub decided_by: &'static str,
    /// Name of the backend that loaded the media
    pub backend: &'static str,
    /// Everything the backend reported
    pub media: LoadedMedia,
}

/// Determines whether a video contains an audio stream.
///
/// Cloning is cheap and clones share the backend, stager and probes.
#[derive(Clone)]
pub struct AudioPresenceDetector {
    backend: Arc<dyn MediaBackend>,
    stager: Arc<dyn MediaStager>,
    probes: Arc<Vec<Box<dyn CapabilityProbe>>>,
}

impl AudioPresenceDetector {
    /// Detector with the given backend, the system temp dir for staging and
    /// the default probe order.
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            stager: Arc::new(TempFileStager::new()),
            probes: Arc::new(probes::default_probes()),
        }
    }

    /// Validates the configuration and builds the detector it describes.
    pub fn from_config(config: &DetectorConfig) -> CoreResult<Self> {
        config.validate()?;
        let stager: Arc<dyn MediaStager> = match &config.temp_dir {
            Some(dir) => Arc::new(TempFileStager::in_dir(dir)),
            None => Arc::new(TempFileStager::new()),
        };
        Ok(Self {
            backend: backend::build_backend(config)?,
            stager,
            probes: Arc::new(probes::probes_for(&config.probes)),
        })
    }

    /// Replaces the stager.
    pub fn with_stager(mut self, stager: Arc<dyn MediaStager>) -> Self {
        self.stager = stager;
        self
    }

    /// Replaces the probe list. An empty list makes every check fail with
    /// `NoDetectionMethodAvailable`.
    pub fn with_probes(mut self, probes: Vec<Box<dyn CapabilityProbe>>) -> Self {
        self.probes = Arc::new(probes);
        self
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn probe_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Checks whether `file` contains audio.
    ///
    /// The file is only read. Calling this again on the same file gives the
    /// same answer.
    pub async fn detect(&self, file: &VideoFile) -> Result<bool, DetectionError> {
        self.inspect(file).await.map(|detection| detection.has_audio)
    }

    /// Like [`AudioPresenceDetector::detect`], but also reports the deciding
    /// probe and what the backend loaded.
    pub async fn inspect(&self, file: &VideoFile) -> Result<Detection, DetectionError> {
        let name = file.name().to_string();
        let file = file.clone();
        let backend = Arc::clone(&self.backend);
        let stager = Arc::clone(&self.stager);
        let probes = Arc::clone(&self.probes);

        log::debug!(
            "Checking {} ({} bytes, {}) with backend '{}'",
            name,
            file.len(),
            file.mime_type(),
            backend.name()
        );

        let task_name = name.clone();
        let task = tokio::task::spawn_blocking(move || {
            let staged = stager
                .stage(&file)
                .map_err(|e| DetectionError::LoadError {
                    file: task_name.clone(),
                    source: MediaLoadError::Staging(e),
                })?;

            let media = backend
                .load(&staged)
                .map_err(|source| DetectionError::LoadError {
                    file: task_name.clone(),
                    source,
                })?;

            match probes::first_verdict(&probes, &media) {
                Some((has_audio, decided_by)) => Ok(Detection {
                    file: task_name,
                    has_audio,
                    decided_by,
                    backend: backend.name(),
                    media,
                }),
                None => Err(DetectionError::NoDetectionMethodAvailable {
                    file: task_name,
                    backend: backend.name().to_string(),
                }),
            }
            // `staged` drops here, after the verdict or error is produced
        });

        let result = match task.await {
            Ok(result) => result,
            Err(join_err) => {
                log::error!("Decoder task for {} did not complete: {}", name, join_err);
                Err(DetectionError::LoadError {
                    file: name.clone(),
                    source: MediaLoadError::Aborted(join_err.to_string()),
                })
            }
        };

        match &result {
            Ok(detection) => log::debug!(
                "{}: has_audio={} (decided by '{}')",
                name,
                detection.has_audio,
                detection.decided_by
            ),
            Err(e) => log::debug!("{}: check failed: {}", name, e),
        }
        result
    }

    /// Checks several files concurrently. Results are in input order.
    pub async fn detect_all(&self, files: &[VideoFile]) -> Vec<Result<Detection, DetectionError>> {
        join_all(files.iter().map(|file| self.inspect(file))).await
    }
}

impl fmt::Debug for AudioPresenceDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPresenceDetector")
            .field("backend", &self.backend.name())
            .field("probes", &self.probe_names())
            .finish()
    }
}
