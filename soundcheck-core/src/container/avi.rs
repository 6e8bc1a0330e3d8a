//! AVI (RIFF) reader.
//!
//! Stream declarations live in the `hdrl` list, one `strl` list per stream:
//! `strh` carries the stream type and `strf` the format block.

use crate::error::MediaLoadError;
use crate::media::{TrackInfo, TrackKind};
use std::io::{Read, Seek, SeekFrom};

const CONTAINER: &str = "avi";

/// Upper bound on the size of the `hdrl` list we are willing to buffer.
pub const MAX_HDRL_SIZE: u64 = 4 * 1024 * 1024;

/// Returns true for a RIFF file of form type `AVI `.
pub fn sniff(header: &[u8]) -> bool {
    header.len() >= 12 && &header[0..4] == b"RIFF" && &header[8..12] == b"AVI "
}

/// Reads the stream list from an AVI file.
pub fn read_tracks<R: Read + Seek>(reader: &mut R) -> Result<Vec<TrackInfo>, MediaLoadError> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    let mut pos = 12u64;
    reader.seek(SeekFrom::Start(pos))?;

    while file_len.saturating_sub(pos) >= 8 {
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let size = u64::from(le_u32(&header[4..8]));

        if &header[0..4] == b"LIST" {
            let mut list_type = [0u8; 4];
            reader.read_exact(&mut list_type)?;
            match &list_type {
                b"hdrl" => {
                    if size < 4 || size > MAX_HDRL_SIZE || pos + 8 + size > file_len {
                        return Err(MediaLoadError::malformed(CONTAINER, "hdrl list is truncated"));
                    }
                    let mut hdrl = vec![0u8; (size - 4) as usize];
                    reader.read_exact(&mut hdrl)?;
                    return parse_hdrl(&hdrl);
                }
                b"movi" => {
                    return Err(MediaLoadError::malformed(CONTAINER, "movi list found before hdrl"));
                }
                _ => {}
            }
        }

        pos += 8 + size + (size & 1);
        reader.seek(SeekFrom::Start(pos))?;
    }

    Err(MediaLoadError::malformed(CONTAINER, "no hdrl list found"))
}

fn parse_hdrl(hdrl: &[u8]) -> Result<Vec<TrackInfo>, MediaLoadError> {
    let mut tracks = Vec::new();
    for chunk in Chunks::new(hdrl) {
        let (id, payload) = chunk?;
        if &id == b"LIST" && payload.get(0..4) == Some(b"strl".as_slice()) {
            let index = tracks.len() as u64;
            tracks.push(parse_strl(&payload[4..], index)?);
        }
    }
    Ok(tracks)
}

fn parse_strl(strl: &[u8], index: u64) -> Result<TrackInfo, MediaLoadError> {
    let mut track = TrackInfo::new(index, TrackKind::Unknown);
    let mut format = None;

    for chunk in Chunks::new(strl) {
        let (id, payload) = chunk?;
        match &id {
            b"strh" => {
                let fcc_type = payload
                    .get(0..4)
                    .ok_or_else(|| MediaLoadError::malformed(CONTAINER, "strh chunk is truncated"))?;
                track.kind = match fcc_type {
                    b"auds" => TrackKind::Audio,
                    b"vids" => TrackKind::Video,
                    b"txts" => TrackKind::Subtitle,
                    _ => TrackKind::Unknown,
                };
                track.codec = payload
                    .get(4..8)
                    .map(|h| String::from_utf8_lossy(h).trim_matches(['\0', ' ']).to_string())
                    .filter(|h| !h.is_empty());
            }
            b"strf" => format = Some(payload),
            _ => {}
        }
    }

    if track.kind == TrackKind::Audio {
        // WAVEFORMATEX: wFormatTag, nChannels, ...
        if let Some(fmt) = format.filter(|f| f.len() >= 4) {
            let tag = u16::from_le_bytes([fmt[0], fmt[1]]);
            let channels = u16::from_le_bytes([fmt[2], fmt[3]]);
            track.codec = Some(audio_format_name(tag));
            track.channels = (channels > 0).then_some(u32::from(channels));
        }
    }
    Ok(track)
}

fn audio_format_name(tag: u16) -> String {
    match tag {
        0x0001 => "pcm".to_string(),
        0x0050 => "mp2".to_string(),
        0x0055 => "mp3".to_string(),
        0x00FF => "aac".to_string(),
        0x2000 => "ac3".to_string(),
        0x2001 => "dts".to_string(),
        other => format!("0x{other:04x}"),
    }
}

/// Iterator over RIFF chunks packed in a buffered list.
struct Chunks<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Chunks<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<([u8; 4], &'a [u8]), MediaLoadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.pos..)?;
        if rest.is_empty() {
            return None;
        }
        if rest.len() < 8 {
            self.pos = self.data.len();
            return Some(Err(MediaLoadError::malformed(CONTAINER, "truncated chunk header")));
        }
        let id = [rest[0], rest[1], rest[2], rest[3]];
        let size = le_u32(&rest[4..8]) as usize;
        let Some(payload) = rest.get(8..8 + size) else {
            self.pos = self.data.len();
            return Some(Err(MediaLoadError::malformed(
                CONTAINER,
                format!("chunk '{}' overruns its list", String::from_utf8_lossy(&id)),
            )));
        };
        // Chunks are padded to an even size; the final pad byte may be missing.
        self.pos += (8 + size + (size & 1)).min(rest.len());
        Some(Ok((id, payload)))
    }
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
