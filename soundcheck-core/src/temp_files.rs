//! Temporary staging of in-memory media for decoders.
//!
//! Backends read from a path, so the bytes of an in-memory [`VideoFile`] are
//! written to a named temporary file first. The returned [`StagedMedia`] owns
//! that file and removes it when dropped, which covers every exit path of a
//! detection including unwinding. A file that is already on disk is handed to
//! the backend in place and never copied or deleted.

use crate::media::VideoFile;
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder as TempFileBuilder, TempPath};

/// Prefix of every staged file name.
pub const STAGED_FILE_PREFIX: &str = "soundcheck_";

/// Callback run once after a staged file has been released.
pub type ReleaseHook = Box<dyn FnOnce(&Path) + Send>;

/// Something that can turn a [`VideoFile`] into a path a decoder can open.
pub trait MediaStager: Send + Sync {
    fn stage(&self, file: &VideoFile) -> io::Result<StagedMedia>;
}

/// A temporary file holding a video's bytes. Deleted on drop.
pub struct StagedMedia {
    path: PathBuf,
    temp: Option<TempPath>,
    release_hook: Option<ReleaseHook>,
}

impl StagedMedia {
    /// Takes ownership of a temporary path; the file is deleted on drop.
    pub fn from_temp_path(temp: TempPath) -> Self {
        Self {
            path: temp.to_path_buf(),
            temp: Some(temp),
            release_hook: None,
        }
    }

    /// Refers to a file the caller keeps ownership of. Nothing is deleted on
    /// drop, only the release hook runs.
    pub fn borrowed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            temp: None,
            release_hook: None,
        }
    }

    /// Registers a callback to run right after the file is released.
    pub fn with_release_hook(mut self, hook: ReleaseHook) -> Self {
        self.release_hook = Some(hook);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for StagedMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedMedia")
            .field("path", &self.path)
            .field("owned", &self.temp.is_some())
            .finish()
    }
}

impl Drop for StagedMedia {
    fn drop(&mut self) {
        if let Some(temp) = self.temp.take() {
            if let Err(e) = temp.close() {
                log::warn!(
                    "Failed to remove staged file {}: {}",
                    self.path.display(),
                    e
                );
            } else {
                log::trace!("Released staged file {}", self.path.display());
            }
        }
        if let Some(hook) = self.release_hook.take() {
            hook(&self.path);
        }
    }
}

/// Stages media as named temporary files, in `dir` or the system temp dir.
#[derive(Debug, Clone, Default)]
pub struct TempFileStager {
    dir: Option<PathBuf>,
}

impl TempFileStager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }
}

impl MediaStager for TempFileStager {
    fn stage(&self, file: &VideoFile) -> io::Result<StagedMedia> {
        let bytes = match (file.bytes(), file.path()) {
            (Some(bytes), _) => bytes,
            (None, Some(path)) => {
                log::debug!("Using {} in place", path.display());
                return Ok(StagedMedia::borrowed(path));
            }
            (None, None) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{} has neither bytes nor a path", file.name()),
                ));
            }
        };

        let suffix = file
            .extension()
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();

        let mut builder = TempFileBuilder::new();
        builder.prefix(STAGED_FILE_PREFIX).suffix(&suffix);
        let mut temp_file = match &self.dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };

        temp_file.write_all(bytes)?;
        temp_file.flush()?;

        let staged = StagedMedia::from_temp_path(temp_file.into_temp_path());
        log::debug!(
            "Staged {} ({} bytes) at {}",
            file.name(),
            file.len(),
            staged.path().display()
        );
        Ok(staged)
    }
}
