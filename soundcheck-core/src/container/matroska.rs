//! Matroska and WebM reader.
//!
//! Walks the EBML header (to validate the DocType) and then the children of
//! the `Segment` until `Tracks` is found. Only `Tracks` is buffered; every
//! other element is skipped by seeking past it.

use crate::error::MediaLoadError;
use crate::media::{TrackInfo, TrackKind};
use std::io::{self, Read, Seek, SeekFrom};

const CONTAINER: &str = "matroska";

/// Magic bytes of the EBML header element id.
pub const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Upper bound on the size of the EBML header or `Tracks` element we buffer.
pub const MAX_ELEMENT_SIZE: u64 = 16 * 1024 * 1024;

mod ids {
    pub const EBML: u32 = 0x1A45_DFA3;
    pub const DOC_TYPE: u32 = 0x4282;
    pub const SEGMENT: u32 = 0x1853_8067;
    pub const TRACKS: u32 = 0x1654_AE6B;
    pub const CLUSTER: u32 = 0x1F43_B675;
    pub const TRACK_ENTRY: u32 = 0xAE;
    pub const TRACK_NUMBER: u32 = 0xD7;
    pub const TRACK_TYPE: u32 = 0x83;
    pub const CODEC_ID: u32 = 0x86;
    pub const LANGUAGE: u32 = 0x22_B59C;
    pub const LANGUAGE_BCP47: u32 = 0x22_B59D;
    pub const AUDIO: u32 = 0xE1;
    pub const CHANNELS: u32 = 0x9F;
}

/// Returns true when `header` starts with the EBML magic.
pub fn sniff(header: &[u8]) -> bool {
    header.starts_with(&EBML_MAGIC)
}

/// A Matroska track list together with the file's DocType.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatroskaTracks {
    pub doc_type: String,
    pub tracks: Vec<TrackInfo>,
}

/// Reads the DocType and track list from a Matroska/WebM stream.
pub fn read_tracks<R: Read + Seek>(reader: &mut R) -> Result<MatroskaTracks, MediaLoadError> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let header = read_element_header(reader)?
        .ok_or_else(|| MediaLoadError::malformed(CONTAINER, "empty file"))?;
    if header.id != ids::EBML {
        return Err(MediaLoadError::malformed(CONTAINER, "missing EBML header"));
    }
    let ebml = read_payload(reader, &header, "EBML header")?;
    let doc_type = doc_type(&ebml)?;
    if doc_type != "matroska" && doc_type != "webm" {
        return Err(MediaLoadError::malformed(
            CONTAINER,
            format!("unsupported DocType '{doc_type}'"),
        ));
    }

    // Skip anything between the EBML header and the Segment (Void, CRC).
    let segment_end = loop {
        let header = read_element_header(reader)?
            .ok_or_else(|| MediaLoadError::malformed(CONTAINER, "no Segment element"))?;
        let data_start = reader.stream_position()?;
        if header.id == ids::SEGMENT {
            break match header.size {
                Some(size) => data_start.saturating_add(size).min(file_len),
                None => file_len,
            };
        }
        skip_element(reader, &header, data_start)?;
    };

    while reader.stream_position()? < segment_end {
        let Some(header) = read_element_header(reader)? else {
            break;
        };
        match header.id {
            ids::TRACKS => {
                let tracks = read_payload(reader, &header, "Tracks")?;
                return Ok(MatroskaTracks {
                    doc_type,
                    tracks: parse_tracks(&tracks)?,
                });
            }
            ids::CLUSTER => {
                return Err(MediaLoadError::malformed(
                    CONTAINER,
                    "Cluster found before Tracks",
                ));
            }
            _ => {
                let data_start = reader.stream_position()?;
                skip_element(reader, &header, data_start)?;
            }
        }
    }

    Err(MediaLoadError::malformed(CONTAINER, "no Tracks element found"))
}

fn doc_type(ebml: &[u8]) -> Result<String, MediaLoadError> {
    for child in Elements::new(ebml) {
        let (id, payload) = child?;
        if id == ids::DOC_TYPE {
            return Ok(read_string(payload));
        }
    }
    // DocType defaults to "matroska" when absent.
    Ok("matroska".to_string())
}

fn parse_tracks(tracks: &[u8]) -> Result<Vec<TrackInfo>, MediaLoadError> {
    let mut out = Vec::new();
    for child in Elements::new(tracks) {
        let (id, payload) = child?;
        if id == ids::TRACK_ENTRY {
            let ordinal = out.len() as u64 + 1;
            out.push(parse_track_entry(payload, ordinal)?);
        }
    }
    Ok(out)
}

fn parse_track_entry(entry: &[u8], ordinal: u64) -> Result<TrackInfo, MediaLoadError> {
    let mut track = TrackInfo::new(ordinal, TrackKind::Unknown);
    let mut bcp47 = None;

    for child in Elements::new(entry) {
        let (id, payload) = child?;
        match id {
            ids::TRACK_NUMBER => track.id = read_uint(payload)?,
            ids::TRACK_TYPE => track.kind = kind_for_track_type(read_uint(payload)?),
            ids::CODEC_ID => track.codec = Some(read_string(payload)),
            ids::LANGUAGE => track.language = Some(read_string(payload)),
            ids::LANGUAGE_BCP47 => bcp47 = Some(read_string(payload)),
            ids::AUDIO => {
                for audio_child in Elements::new(payload) {
                    let (audio_id, value) = audio_child?;
                    if audio_id == ids::CHANNELS {
                        let channels = read_uint(value)?;
                        track.channels = u32::try_from(channels).ok().filter(|&c| c > 0);
                    }
                }
            }
            _ => {}
        }
    }

    // LanguageBCP47 takes precedence over the legacy Language element.
    if bcp47.is_some() {
        track.language = bcp47;
    }
    if track.language.as_deref() == Some("und") {
        track.language = None;
    }
    Ok(track)
}

fn kind_for_track_type(track_type: u64) -> TrackKind {
    match track_type {
        1 => TrackKind::Video,
        2 => TrackKind::Audio,
        0x11 => TrackKind::Subtitle,
        0x20 | 0x21 => TrackKind::Data,
        _ => TrackKind::Unknown,
    }
}

struct ElementHeader {
    id: u32,
    size: Option<u64>,
}

/// Reads an element id and size. `Ok(None)` at a clean end of stream.
fn read_element_header<R: Read>(reader: &mut R) -> Result<Option<ElementHeader>, MediaLoadError> {
    let mut first = [0u8; 1];
    if reader.read(&mut first)? == 0 {
        return Ok(None);
    }
    let id_len = vint_length(first[0])
        .filter(|&len| len <= 4)
        .ok_or_else(|| MediaLoadError::malformed(CONTAINER, "invalid element id"))?;
    let mut id = u32::from(first[0]);
    for _ in 1..id_len {
        id = (id << 8) | u32::from(read_byte(reader)?);
    }

    let first = read_byte(reader)?;
    let size_len = vint_length(first)
        .ok_or_else(|| MediaLoadError::malformed(CONTAINER, "invalid element size"))?;
    let mut rest = [0u8; 7];
    reader.read_exact(&mut rest[..size_len - 1])?;
    let size = decode_size(first, &rest[..size_len - 1]);

    Ok(Some(ElementHeader { id, size }))
}

fn read_payload<R: Read>(
    reader: &mut R,
    header: &ElementHeader,
    what: &str,
) -> Result<Vec<u8>, MediaLoadError> {
    let size = header
        .size
        .ok_or_else(|| MediaLoadError::malformed(CONTAINER, format!("{what} has unknown size")))?;
    if size > MAX_ELEMENT_SIZE {
        return Err(MediaLoadError::malformed(
            CONTAINER,
            format!("{what} of {size} bytes exceeds the supported size"),
        ));
    }
    let mut payload = vec![0u8; size as usize];
    reader.read_exact(&mut payload).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            MediaLoadError::malformed(CONTAINER, format!("{what} is truncated"))
        } else {
            MediaLoadError::Io(e)
        }
    })?;
    Ok(payload)
}

fn skip_element<R: Seek>(
    reader: &mut R,
    header: &ElementHeader,
    data_start: u64,
) -> Result<(), MediaLoadError> {
    let size = header.size.ok_or_else(|| {
        MediaLoadError::malformed(
            CONTAINER,
            format!("element 0x{:X} has unknown size", header.id),
        )
    })?;
    reader.seek(SeekFrom::Start(data_start.saturating_add(size)))?;
    Ok(())
}

fn read_byte<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Total length in bytes of a variable-size integer, from its first byte.
fn vint_length(first: u8) -> Option<usize> {
    match first.leading_zeros() {
        lz @ 0..=7 => Some(lz as usize + 1),
        _ => None,
    }
}

/// Decodes a size vint. All value bits set means "unknown size".
fn decode_size(first: u8, rest: &[u8]) -> Option<u64> {
    let len = rest.len() + 1;
    let marker_mask = if len == 8 { 0 } else { 0xFFu8 >> len };
    let mut value = u64::from(first & marker_mask);
    for &b in rest {
        value = (value << 8) | u64::from(b);
    }
    let all_ones = (1u64 << (7 * len)) - 1;
    (value != all_ones).then_some(value)
}

fn read_uint(payload: &[u8]) -> Result<u64, MediaLoadError> {
    if payload.len() > 8 {
        return Err(MediaLoadError::malformed(
            CONTAINER,
            format!("unsigned integer of {} bytes", payload.len()),
        ));
    }
    Ok(payload.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

fn read_string(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload)
        .trim_end_matches('\0')
        .to_string()
}

/// Iterator over child elements packed in a buffered master element.
struct Elements<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Elements<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn fail(&mut self, reason: String) -> Option<Result<(u32, &'a [u8]), MediaLoadError>> {
        self.pos = self.data.len();
        Some(Err(MediaLoadError::malformed(CONTAINER, reason)))
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Result<(u32, &'a [u8]), MediaLoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.pos..)?;
        if rest.is_empty() {
            return None;
        }

        let id_len = match vint_length(rest[0]).filter(|&len| len <= 4) {
            Some(len) if len < rest.len() => len,
            _ => return self.fail("invalid or truncated element id".to_string()),
        };
        let id = rest[..id_len]
            .iter()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b));

        let size_len = match vint_length(rest[id_len]) {
            Some(len) if id_len + len <= rest.len() => len,
            _ => return self.fail(format!("invalid or truncated size of element 0x{id:X}")),
        };
        let header_len = id_len + size_len;
        let size = match decode_size(rest[id_len], &rest[id_len + 1..header_len]) {
            Some(size) => size,
            None => return self.fail(format!("element 0x{id:X} has unknown size")),
        };
        if size > (rest.len() - header_len) as u64 {
            return self.fail(format!("element 0x{id:X} overruns its parent"));
        }

        let end = header_len + size as usize;
        self.pos += end;
        Some(Ok((id, &rest[header_len..end])))
    }
}
