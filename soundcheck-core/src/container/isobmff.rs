//! ISO base media file format reader (MP4, MOV, M4V, 3GP).
//!
//! Only the `moov` box is loaded into memory. Tracks come from its `trak`
//! children:
//!
//! ```text
//! moov
//! └── trak
//!     ├── tkhd              track id
//!     └── mdia
//!         ├── mdhd          language
//!         ├── hdlr          handler type (soun, vide, ...)
//!         └── minf/stbl/stsd  first sample entry (codec, channels)
//! ```

use crate::error::MediaLoadError;
use crate::media::{TrackInfo, TrackKind};
use std::io::{Read, Seek, SeekFrom};

const CONTAINER: &str = "mp4";

/// Upper bound on the size of a `moov` box we are willing to buffer.
pub const MAX_MOOV_SIZE: u64 = 64 * 1024 * 1024;

/// Box types that may legitimately open an ISO-BMFF file.
pub const TOP_LEVEL_BOX_TYPES: &[&[u8; 4]] = &[
    b"ftyp", b"styp", b"moov", b"mdat", b"free", b"skip", b"wide", b"pnot",
];

/// Returns true when `header` starts with a known top-level box.
pub fn sniff(header: &[u8]) -> bool {
    header
        .get(4..8)
        .is_some_and(|kind| TOP_LEVEL_BOX_TYPES.iter().any(|t| t.as_slice() == kind))
}

/// Reads the track list from an ISO-BMFF stream.
pub fn read_tracks<R: Read + Seek>(reader: &mut R) -> Result<Vec<TrackInfo>, MediaLoadError> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;
    let mut pos = 0u64;

    while file_len - pos >= 8 {
        let remaining = file_len - pos;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let kind = [header[4], header[5], header[6], header[7]];

        let (header_len, size) = match be_u32(&header[0..4]) {
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large)?;
                (16, u64::from_be_bytes(large))
            }
            0 => (8, remaining),
            n => (8, u64::from(n)),
        };
        if size < header_len {
            return Err(MediaLoadError::malformed(
                CONTAINER,
                format!("box '{}' has invalid size {}", fourcc(&kind), size),
            ));
        }

        if &kind == b"moov" {
            if size > remaining {
                return Err(MediaLoadError::malformed(CONTAINER, "moov box is truncated"));
            }
            let payload_len = size - header_len;
            if payload_len > MAX_MOOV_SIZE {
                return Err(MediaLoadError::malformed(
                    CONTAINER,
                    format!("moov box of {payload_len} bytes exceeds the supported size"),
                ));
            }
            let mut payload = vec![0u8; payload_len as usize];
            reader.read_exact(&mut payload)?;
            return parse_moov(&payload);
        }

        if size > remaining {
            // A partially downloaded file often ends inside mdat.
            log::debug!(
                "Top-level box '{}' runs past end of file, stopping scan",
                fourcc(&kind)
            );
            break;
        }
        pos += size;
        reader.seek(SeekFrom::Start(pos))?;
    }

    Err(MediaLoadError::malformed(CONTAINER, "no moov box found"))
}

fn parse_moov(moov: &[u8]) -> Result<Vec<TrackInfo>, MediaLoadError> {
    let mut tracks = Vec::new();
    for child in Boxes::new(moov) {
        let (kind, payload) = child?;
        if &kind == b"trak" {
            let ordinal = tracks.len() as u64 + 1;
            tracks.push(parse_trak(payload, ordinal)?);
        }
    }
    Ok(tracks)
}

fn parse_trak(trak: &[u8], ordinal: u64) -> Result<TrackInfo, MediaLoadError> {
    let mut track = TrackInfo::new(ordinal, TrackKind::Unknown);

    for child in Boxes::new(trak) {
        let (kind, payload) = child?;
        match &kind {
            b"tkhd" => {
                if let Some(id) = track_id(payload) {
                    track.id = u64::from(id);
                }
            }
            b"mdia" => parse_mdia(payload, &mut track)?,
            _ => {}
        }
    }
    Ok(track)
}

fn parse_mdia(mdia: &[u8], track: &mut TrackInfo) -> Result<(), MediaLoadError> {
    let mut sample_entry = None;

    for child in Boxes::new(mdia) {
        let (kind, payload) = child?;
        match &kind {
            b"hdlr" => {
                if let Some(handler) = payload.get(8..12) {
                    track.kind = kind_for_handler(handler);
                }
            }
            b"mdhd" => track.language = media_language(payload),
            b"minf" => sample_entry = first_sample_entry(payload)?,
            _ => {}
        }
    }

    if let Some((codec, entry)) = sample_entry {
        track.codec = Some(fourcc(&codec));
        if track.kind == TrackKind::Audio {
            track.channels = audio_channel_count(entry);
        }
    }
    Ok(())
}

/// Finds `stbl/stsd` inside `minf` and returns its first sample entry.
fn first_sample_entry(minf: &[u8]) -> Result<Option<([u8; 4], &[u8])>, MediaLoadError> {
    let Some(stbl) = find_child(minf, b"stbl")? else {
        return Ok(None);
    };
    let Some(stsd) = find_child(stbl, b"stsd")? else {
        return Ok(None);
    };
    // Full box header (4) + entry_count (4), then sample entries as boxes.
    let Some(entries) = stsd.get(8..) else {
        return Err(MediaLoadError::malformed(CONTAINER, "stsd box is truncated"));
    };
    Boxes::new(entries).next().transpose()
}

fn find_child<'a>(parent: &'a [u8], wanted: &[u8; 4]) -> Result<Option<&'a [u8]>, MediaLoadError> {
    for child in Boxes::new(parent) {
        let (kind, payload) = child?;
        if &kind == wanted {
            return Ok(Some(payload));
        }
    }
    Ok(None)
}

fn kind_for_handler(handler: &[u8]) -> TrackKind {
    match handler {
        b"soun" => TrackKind::Audio,
        b"vide" => TrackKind::Video,
        b"sbtl" | b"subt" | b"text" | b"clcp" => TrackKind::Subtitle,
        b"meta" | b"hint" | b"tmcd" => TrackKind::Data,
        _ => TrackKind::Unknown,
    }
}

/// Track id from a `tkhd` payload (version 0 or 1).
fn track_id(tkhd: &[u8]) -> Option<u32> {
    let offset = match tkhd.first()? {
        1 => 20,
        _ => 12,
    };
    tkhd.get(offset..offset + 4).map(be_u32)
}

/// ISO-639-2/T language packed into `mdhd`, `None` for "und".
fn media_language(mdhd: &[u8]) -> Option<String> {
    let offset = match mdhd.first()? {
        1 => 32,
        _ => 20,
    };
    let packed = mdhd.get(offset..offset + 2).map(be_u16)?;
    if packed == 0 {
        return None;
    }
    let language: String = [10u16, 5, 0]
        .iter()
        .map(|shift| char::from((((packed >> shift) & 0x1F) as u8) + 0x60))
        .collect();
    (language != "und").then_some(language)
}

/// Channel count of an audio sample entry, including QuickTime version 2
/// sound descriptions.
fn audio_channel_count(entry: &[u8]) -> Option<u32> {
    let version = entry.get(8..10).map(be_u16)?;
    let channels = if version == 2 {
        entry.get(40..44).map(be_u32)?
    } else {
        u32::from(entry.get(16..18).map(be_u16)?)
    };
    (channels > 0).then_some(channels)
}

/// Iterator over the child boxes packed in a parent payload.
struct Boxes<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Boxes<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn fail(&mut self, reason: String) -> Option<Result<([u8; 4], &'a [u8]), MediaLoadError>> {
        self.pos = self.data.len();
        Some(Err(MediaLoadError::malformed(CONTAINER, reason)))
    }
}

impl<'a> Iterator for Boxes<'a> {
    type Item = Result<([u8; 4], &'a [u8]), MediaLoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.pos..)?;
        if rest.is_empty() {
            return None;
        }
        if rest.len() < 8 {
            return self.fail(format!("{} trailing bytes are too short for a box", rest.len()));
        }
        let kind = [rest[4], rest[5], rest[6], rest[7]];

        let (header_len, size) = match be_u32(&rest[0..4]) {
            1 => match rest.get(8..16) {
                Some(large) => (16usize, u64::from_be_bytes([
                    large[0], large[1], large[2], large[3], large[4], large[5], large[6], large[7],
                ])),
                None => return self.fail(format!("box '{}' is truncated", fourcc(&kind))),
            },
            0 => (8, rest.len() as u64),
            n => (8, u64::from(n)),
        };
        if size < header_len as u64 || size > rest.len() as u64 {
            return self.fail(format!(
                "box '{}' of {} bytes overruns its parent",
                fourcc(&kind),
                size
            ));
        }

        let size = size as usize;
        self.pos += size;
        Some(Ok((kind, &rest[header_len..size])))
    }
}

fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn fourcc(kind: &[u8; 4]) -> String {
    String::from_utf8_lossy(kind).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn mp4_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(payload);
        out
    }

    fn hdlr(handler: &[u8; 4]) -> Vec<u8> {
        let mut payload = vec![0u8; 8];
        payload.extend_from_slice(handler);
        payload.extend_from_slice(&[0u8; 13]);
        mp4_box(b"hdlr", &payload)
    }

    fn tkhd(id: u32) -> Vec<u8> {
        let mut payload = vec![0u8; 12];
        payload.extend_from_slice(&id.to_be_bytes());
        payload.extend_from_slice(&[0u8; 64]);
        mp4_box(b"tkhd", &payload)
    }

    fn mdhd(language: u16) -> Vec<u8> {
        let mut payload = vec![0u8; 20];
        payload.extend_from_slice(&language.to_be_bytes());
        payload.extend_from_slice(&[0u8; 2]);
        mp4_box(b"mdhd", &payload)
    }

    fn stsd(codec: &[u8; 4], channels: u16) -> Vec<u8> {
        let mut entry = vec![0u8; 16];
        entry.extend_from_slice(&channels.to_be_bytes());
        entry.extend_from_slice(&[0u8; 10]);
        let mut payload = vec![0, 0, 0, 0, 0, 0, 0, 1];
        payload.extend(mp4_box(codec, &entry));
        mp4_box(b"stsd", &payload)
    }

    fn trak(id: u32, handler: &[u8; 4], codec: &[u8; 4], channels: u16) -> Vec<u8> {
        let stbl = mp4_box(b"stbl", &stsd(codec, channels));
        let minf = mp4_box(b"minf", &stbl);
        let mut mdia = hdlr(handler);
        mdia.extend(mdhd(0x15C7)); // "eng"
        mdia.extend(minf);
        let mut payload = tkhd(id);
        payload.extend(mp4_box(b"mdia", &mdia));
        mp4_box(b"trak", &payload)
    }

    fn ftyp() -> Vec<u8> {
        mp4_box(b"ftyp", b"isom\0\0\x02\0isomiso2")
    }

    #[test]
    fn reads_audio_and_video_tracks() {
        let mut moov = trak(1, b"vide", b"avc1", 0);
        moov.extend(trak(2, b"soun", b"mp4a", 2));
        let mut file = ftyp();
        file.extend(mp4_box(b"moov", &moov));
        file.extend(mp4_box(b"mdat", &[0u8; 64]));

        let tracks = read_tracks(&mut Cursor::new(file)).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].kind, TrackKind::Video);
        assert_eq!(tracks[0].codec.as_deref(), Some("avc1"));
        assert_eq!(tracks[0].channels, None);
        assert_eq!(tracks[1].id, 2);
        assert_eq!(tracks[1].kind, TrackKind::Audio);
        assert_eq!(tracks[1].codec.as_deref(), Some("mp4a"));
        assert_eq!(tracks[1].channels, Some(2));
        assert_eq!(tracks[1].language.as_deref(), Some("eng"));
    }

    #[test]
    fn moov_after_mdat_is_found() {
        let mut file = ftyp();
        file.extend(mp4_box(b"mdat", &[0u8; 128]));
        file.extend(mp4_box(b"moov", &trak(1, b"vide", b"hvc1", 0)));

        let tracks = read_tracks(&mut Cursor::new(file)).unwrap();
        assert_eq!(tracks.len(), 1);
        assert!(!tracks[0].is_audio());
    }

    #[test]
    fn large_size_boxes_are_skipped() {
        let mut file = ftyp();
        // 64-bit size mdat: size field 1, then largesize including the 16-byte header.
        file.extend_from_slice(&1u32.to_be_bytes());
        file.extend_from_slice(b"mdat");
        file.extend_from_slice(&(16u64 + 32).to_be_bytes());
        file.extend_from_slice(&[0u8; 32]);
        file.extend(mp4_box(b"moov", &trak(7, b"soun", b"Opus", 6)));

        let tracks = read_tracks(&mut Cursor::new(file)).unwrap();
        assert_eq!(tracks[0].id, 7);
        assert_eq!(tracks[0].channels, Some(6));
    }

    #[test]
    fn size_zero_box_extends_to_end_of_file() {
        let mut file = ftyp();
        file.extend(mp4_box(b"free", &[0u8; 8]));
        // moov with size 0: runs to the end of the file
        file.extend_from_slice(&0u32.to_be_bytes());
        file.extend_from_slice(b"moov");
        file.extend(trak(3, b"soun", b"mp4a", 2));

        let tracks = read_tracks(&mut Cursor::new(file)).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 3);
        assert!(tracks[0].is_audio());
    }

    #[test]
    fn size_zero_child_box_extends_to_end_of_parent() {
        let mut moov = trak(1, b"vide", b"avc1", 0);
        let audio = trak(2, b"soun", b"mp4a", 2);
        // Last trak with size 0: runs to the end of moov
        moov.extend_from_slice(&0u32.to_be_bytes());
        moov.extend_from_slice(b"trak");
        moov.extend_from_slice(&audio[8..]);
        let mut file = ftyp();
        file.extend(mp4_box(b"moov", &moov));

        let tracks = read_tracks(&mut Cursor::new(file)).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[1].id, 2);
        assert_eq!(tracks[1].channels, Some(2));
    }

    #[test]
    fn missing_moov_is_malformed() {
        let mut file = ftyp();
        file.extend(mp4_box(b"mdat", &[0u8; 16]));
        let err = read_tracks(&mut Cursor::new(file)).unwrap_err();
        assert!(matches!(err, MediaLoadError::Malformed { .. }));
        assert!(err.to_string().contains("no moov box"));
    }

    #[test]
    fn truncated_child_box_is_malformed() {
        let mut moov = trak(1, b"soun", b"mp4a", 2);
        // Claim a child box that is longer than what remains in moov.
        moov.extend_from_slice(&100u32.to_be_bytes());
        moov.extend_from_slice(b"trak");
        let mut file = ftyp();
        file.extend(mp4_box(b"moov", &moov));

        let err = read_tracks(&mut Cursor::new(file)).unwrap_err();
        assert!(err.to_string().contains("overruns its parent"));
    }

    #[test]
    fn sniff_accepts_known_top_level_boxes() {
        assert!(sniff(&ftyp()));
        assert!(sniff(b"\0\0\0\x08free"));
        assert!(!sniff(b"\0\0\0\x08abcd"));
        assert!(!sniff(b"\0\0"));
    }

    #[test]
    fn undetermined_language_is_dropped() {
        let mut payload = vec![0u8; 20];
        payload.extend_from_slice(&0x55C4u16.to_be_bytes());
        assert_eq!(media_language(&payload), None);
    }
}
