//! Video file handles and media information types.
//!
//! A [`VideoFile`] is the caller-owned input to the detector: a name, a MIME
//! type and the media itself, either bytes in memory or a file on disk. The
//! detector only ever reads it. The types in [`info`] describe what a backend
//! found after loading one.

pub mod info;

pub use info::{AudioTrack, LoadedMedia, TrackInfo, TrackKind};

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// MIME type used when neither the extension nor the content identify a video.
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Bytes read from the start of a file to sniff its container.
pub const SNIFF_LEN: u64 = 64;

/// File extensions recognized as video, with their MIME types.
pub const VIDEO_EXTENSIONS: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mov", "video/quicktime"),
    ("3gp", "video/3gpp"),
    ("mkv", "video/x-matroska"),
    ("webm", "video/webm"),
    ("avi", "video/x-msvideo"),
    ("ts", "video/mp2t"),
    ("m2ts", "video/mp2t"),
    ("mts", "video/mp2t"),
    ("mpg", "video/mpeg"),
    ("mpeg", "video/mpeg"),
    ("flv", "video/x-flv"),
    ("wmv", "video/x-ms-wmv"),
    ("asf", "video/x-ms-asf"),
    ("ogv", "video/ogg"),
];

#[derive(Clone)]
enum MediaSource {
    Memory(Arc<[u8]>),
    Disk { path: Arc<Path>, len: u64 },
}

/// Opaque handle to binary video media.
///
/// Cloning is cheap: in-memory bytes are shared and files on disk are never
/// read in full.
#[derive(Clone)]
pub struct VideoFile {
    name: String,
    mime_type: String,
    source: MediaSource,
}

impl VideoFile {
    /// Wraps bytes that are already in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            source: MediaSource::Memory(bytes.into()),
        }
    }

    /// Refers to a file on disk. Only the first [`SNIFF_LEN`] bytes are read:
    /// the MIME type comes from the extension, or from those bytes when the
    /// extension is unknown.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let read_error =
            |e: std::io::Error| CoreError::PathError(format!("Failed to read '{}': {}", path.display(), e));

        let file = File::open(path).map_err(read_error)?;
        let metadata = file.metadata().map_err(read_error)?;
        if !metadata.is_file() {
            return Err(CoreError::PathError(format!(
                "'{}' is not a regular file",
                path.display()
            )));
        }

        let mut header = Vec::with_capacity(SNIFF_LEN as usize);
        file.take(SNIFF_LEN).read_to_end(&mut header).map_err(read_error)?;

        let name = crate::utils::get_filename_safe(path)?;
        let mime_type = mime_type_for_path(path)
            .or_else(|| sniff_mime_type(&header))
            .unwrap_or(FALLBACK_MIME_TYPE);

        log::debug!(
            "Opened {} ({} bytes, {})",
            name,
            metadata.len(),
            mime_type
        );
        Ok(Self {
            name,
            mime_type: mime_type.to_string(),
            source: MediaSource::Disk {
                path: Arc::from(path),
                len: metadata.len(),
            },
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The bytes, for media held in memory.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.source {
            MediaSource::Memory(bytes) => Some(&**bytes),
            MediaSource::Disk { .. } => None,
        }
    }

    /// The path, for media that lives on disk.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            MediaSource::Memory(_) => None,
            MediaSource::Disk { path, .. } => Some(&**path),
        }
    }

    /// Size of the media in bytes.
    pub fn len(&self) -> u64 {
        match &self.source {
            MediaSource::Memory(bytes) => bytes.len() as u64,
            MediaSource::Disk { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the MIME type is in the `video/*` family.
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    /// File extension matching the MIME type, used when staging the bytes.
    pub fn extension(&self) -> Option<&'static str> {
        VIDEO_EXTENSIONS
            .iter()
            .find(|(_, mime)| *mime == self.mime_type)
            .map(|(ext, _)| *ext)
    }
}

impl fmt::Debug for VideoFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("VideoFile");
        debug
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.len());
        if let Some(path) = self.path() {
            debug.field("path", &path);
        }
        debug.finish()
    }
}

/// Looks up the video MIME type for a path's extension (case-insensitive).
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    VIDEO_EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
}

/// Guesses a MIME type from the leading bytes of a file.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some("video/x-matroska");
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"AVI " {
        return Some("video/x-msvideo");
    }
    if bytes.len() >= 8 && &bytes[4..8] == b"ftyp" {
        return Some(match bytes.get(8..12) {
            Some(b"qt  ") => "video/quicktime",
            Some(brand) if brand.starts_with(b"3g") => "video/3gpp",
            _ => "video/mp4",
        });
    }
    None
}
