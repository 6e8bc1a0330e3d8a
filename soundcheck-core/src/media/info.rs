//! Track and capability information produced by media backends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an elementary stream inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Subtitle,
    Data,
    Unknown,
}

impl From<&str> for TrackKind {
    fn from(s: &str) -> Self {
        match s {
            "video" => TrackKind::Video,
            "audio" => TrackKind::Audio,
            "subtitle" => TrackKind::Subtitle,
            "data" => TrackKind::Data,
            _ => TrackKind::Unknown,
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Video => write!(f, "Video"),
            TrackKind::Audio => write!(f, "Audio"),
            TrackKind::Subtitle => write!(f, "Subtitle"),
            TrackKind::Data => write!(f, "Data"),
            TrackKind::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A track as declared in a container header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Track id or stream index, as numbered by the container
    pub id: u64,

    /// What the track carries
    pub kind: TrackKind,

    /// Codec identifier (fourcc, Matroska CodecID or ffprobe codec name)
    pub codec: Option<String>,

    /// Channel count, audio tracks only
    pub channels: Option<u32>,

    /// Language tag when the container declares one
    pub language: Option<String>,
}

impl TrackInfo {
    pub fn new(id: u64, kind: TrackKind) -> Self {
        Self {
            id,
            kind,
            codec: None,
            channels: None,
            language: None,
        }
    }

    pub fn is_audio(&self) -> bool {
        self.kind == TrackKind::Audio
    }
}

/// An audio track exposed through the live track list capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    pub index: u64,
    pub codec: Option<String>,
    pub channels: Option<u32>,
    pub language: Option<String>,
}

impl From<&TrackInfo> for AudioTrack {
    fn from(track: &TrackInfo) -> Self {
        Self {
            index: track.id,
            codec: track.codec.clone(),
            channels: track.channels,
            language: track.language.clone(),
        }
    }
}

impl fmt::Display for AudioTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)?;
        if let Some(codec) = &self.codec {
            write!(f, " {codec}")?;
        }
        if let Some(channels) = self.channels {
            write!(f, " {channels}ch")?;
        }
        if let Some(language) = &self.language {
            write!(f, " [{language}]")?;
        }
        Ok(())
    }
}

/// The capability surface a backend exposes for a loaded file.
///
/// Every field is optional: `None` means the backend does not offer that
/// primitive at all, which is different from offering it with an empty or
/// zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedMedia {
    /// Container format name as reported by the backend
    pub container: Option<String>,

    /// Live list of audio tracks
    pub audio_tracks: Option<Vec<AudioTrack>>,

    /// Boolean "has audio" flag
    pub has_audio: Option<bool>,

    /// Number of audio bytes produced by decoding
    pub audio_decoded_bytes: Option<u64>,
}

impl LoadedMedia {
    /// Builds the capability surface of a fully parsed container header.
    ///
    /// A complete header parse is authoritative, so both the track list and
    /// the flag are exposed.
    pub fn from_tracks(container: impl Into<String>, tracks: &[TrackInfo]) -> Self {
        let audio_tracks: Vec<AudioTrack> = tracks
            .iter()
            .filter(|t| t.is_audio())
            .map(AudioTrack::from)
            .collect();
        Self {
            container: Some(container.into()),
            has_audio: Some(!audio_tracks.is_empty()),
            audio_tracks: Some(audio_tracks),
            audio_decoded_bytes: None,
        }
    }
}
