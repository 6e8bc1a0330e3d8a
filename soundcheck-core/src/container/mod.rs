//! Native container header readers.
//!
//! These readers never decode media. They identify the container from its
//! magic bytes and read the track declarations from the header, which is
//! enough to know whether an audio track exists without any external tools.

pub mod avi;
pub mod isobmff;
pub mod matroska;

use crate::backend::MediaBackend;
use crate::error::MediaLoadError;
use crate::media::{LoadedMedia, TrackInfo};
use crate::temp_files::StagedMedia;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

/// Number of leading bytes inspected to identify a container.
const SNIFF_LEN: u64 = 16;

/// Container families understood by the native readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    IsoBmff,
    Matroska,
    Avi,
}

impl ContainerKind {
    pub fn name(&self) -> &'static str {
        match self {
            ContainerKind::IsoBmff => "mp4",
            ContainerKind::Matroska => "matroska",
            ContainerKind::Avi => "avi",
        }
    }
}

/// Identifies the container family from the leading bytes of a file.
pub fn sniff(header: &[u8]) -> Option<ContainerKind> {
    if matroska::sniff(header) {
        Some(ContainerKind::Matroska)
    } else if avi::sniff(header) {
        Some(ContainerKind::Avi)
    } else if isobmff::sniff(header) {
        Some(ContainerKind::IsoBmff)
    } else {
        None
    }
}

/// Tracks declared by a container, with the container's format name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    pub format: String,
    pub tracks: Vec<TrackInfo>,
}

/// Identifies the container and reads its track declarations.
pub fn read_container<R: Read + Seek>(reader: &mut R) -> Result<ContainerInfo, MediaLoadError> {
    reader.seek(SeekFrom::Start(0))?;
    let mut header = Vec::with_capacity(SNIFF_LEN as usize);
    reader.by_ref().take(SNIFF_LEN).read_to_end(&mut header)?;

    let kind = sniff(&header).ok_or(MediaLoadError::UnsupportedFormat)?;
    log::debug!("Identified {} container", kind.name());

    let info = match kind {
        ContainerKind::IsoBmff => ContainerInfo {
            format: kind.name().to_string(),
            tracks: isobmff::read_tracks(reader)?,
        },
        ContainerKind::Matroska => {
            let parsed = matroska::read_tracks(reader)?;
            ContainerInfo {
                format: parsed.doc_type,
                tracks: parsed.tracks,
            }
        }
        ContainerKind::Avi => ContainerInfo {
            format: kind.name().to_string(),
            tracks: avi::read_tracks(reader)?,
        },
    };
    Ok(info)
}

/// Backend that reads container headers directly, without external tools.
///
/// Exposes the audio track list and the "has audio" flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerBackend;

impl ContainerBackend {
    pub fn new() -> Self {
        Self
    }
}

impl MediaBackend for ContainerBackend {
    fn name(&self) -> &'static str {
        "container"
    }

    fn load(&self, media: &StagedMedia) -> Result<LoadedMedia, MediaLoadError> {
        let mut reader = BufReader::new(File::open(media.path())?);
        let info = read_container(&mut reader)?;
        log::debug!(
            "{}: {} container with {} track(s)",
            media.path().display(),
            info.format,
            info.tracks.len()
        );
        Ok(LoadedMedia::from_tracks(info.format, &info.tracks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn sniff_dispatches_by_magic() {
        assert_eq!(sniff(&[0x1A, 0x45, 0xDF, 0xA3, 0x01]), Some(ContainerKind::Matroska));
        assert_eq!(sniff(b"RIFF\x10\0\0\0AVI LIST"), Some(ContainerKind::Avi));
        assert_eq!(sniff(b"\0\0\0\x10ftypisom\0\0\0\0"), Some(ContainerKind::IsoBmff));
        assert_eq!(sniff(b"RIFF\x10\0\0\0WAVEfmt "), None);
        assert_eq!(sniff(b""), None);
    }

    #[test]
    fn unknown_bytes_are_unsupported() {
        let err = read_container(&mut Cursor::new(b"definitely not a video".to_vec())).unwrap_err();
        assert!(matches!(err, MediaLoadError::UnsupportedFormat));
    }

    #[test]
    fn empty_input_is_unsupported() {
        let err = read_container(&mut Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, MediaLoadError::UnsupportedFormat));
    }
}
