//! Capability probes.
//!
//! Each probe asks one question of the loaded media. A probe that cannot
//! answer because the backend does not expose its primitive returns `None`,
//! and the detector moves on to the next probe. The first `Some` decides.

use crate::error::{CoreError, CoreResult};
use crate::media::LoadedMedia;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single audio-presence question asked of loaded media.
pub trait CapabilityProbe: Send + Sync {
    /// Short name used in logs and in [`crate::Detection::decided_by`].
    fn name(&self) -> &'static str;

    /// `Some(verdict)` when this probe applies, `None` to defer.
    fn probe(&self, media: &LoadedMedia) -> Option<bool>;
}

/// Answers `true` when the backend lists at least one audio track.
///
/// An empty list does not mean "no audio": it defers to the next probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioTrackListProbe;

impl CapabilityProbe for AudioTrackListProbe {
    fn name(&self) -> &'static str {
        ProbeKind::Tracks.as_str()
    }

    fn probe(&self, media: &LoadedMedia) -> Option<bool> {
        media
            .audio_tracks
            .as_ref()
            .filter(|tracks| !tracks.is_empty())
            .map(|_| true)
    }
}

/// Answers with the backend's "has audio" flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct HasAudioFlagProbe;

impl CapabilityProbe for HasAudioFlagProbe {
    fn name(&self) -> &'static str {
        ProbeKind::Flag.as_str()
    }

    fn probe(&self, media: &LoadedMedia) -> Option<bool> {
        media.has_audio
    }
}

/// Answers `count > 0` from the number of decoded audio bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodedAudioBytesProbe;

impl CapabilityProbe for DecodedAudioBytesProbe {
    fn name(&self) -> &'static str {
        ProbeKind::Decoded.as_str()
    }

    fn probe(&self, media: &LoadedMedia) -> Option<bool> {
        media.audio_decoded_bytes.map(|bytes| bytes > 0)
    }
}

/// Names of the built-in probes, for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Tracks,
    Flag,
    Decoded,
}

impl ProbeKind {
    /// Default probe order.
    pub const DEFAULT_ORDER: [ProbeKind; 3] = [ProbeKind::Tracks, ProbeKind::Flag, ProbeKind::Decoded];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Tracks => "tracks",
            ProbeKind::Flag => "flag",
            ProbeKind::Decoded => "decoded",
        }
    }

    /// Builds the probe this kind names.
    pub fn build(&self) -> Box<dyn CapabilityProbe> {
        match self {
            ProbeKind::Tracks => Box::new(AudioTrackListProbe),
            ProbeKind::Flag => Box::new(HasAudioFlagProbe),
            ProbeKind::Decoded => Box::new(DecodedAudioBytesProbe),
        }
    }

    /// Parses a comma-separated probe list such as `tracks,flag`.
    ///
    /// Blank entries are ignored, so an empty string yields an empty list.
    /// Duplicates are rejected.
    pub fn parse_list(list: &str) -> CoreResult<Vec<ProbeKind>> {
        let mut kinds = Vec::new();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let kind: ProbeKind = item.parse()?;
            if kinds.contains(&kind) {
                return Err(CoreError::Config(format!("probe '{kind}' listed more than once")));
            }
            kinds.push(kind);
        }
        Ok(kinds)
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProbeKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProbeKind::DEFAULT_ORDER
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CoreError::Config(format!(
                    "unknown probe '{s}' (expected one of: tracks, flag, decoded)"
                ))
            })
    }
}

/// The built-in probes in priority order: track list, flag, decoded bytes.
pub fn default_probes() -> Vec<Box<dyn CapabilityProbe>> {
    probes_for(&ProbeKind::DEFAULT_ORDER)
}

/// Builds probes for the given kinds, keeping their order.
pub fn probes_for(kinds: &[ProbeKind]) -> Vec<Box<dyn CapabilityProbe>> {
    kinds.iter().map(ProbeKind::build).collect()
}

/// Runs the probes in order and returns the first verdict with the name of
/// the probe that produced it.
pub fn first_verdict(
    probes: &[Box<dyn CapabilityProbe>],
    media: &LoadedMedia,
) -> Option<(bool, &'static str)> {
    probes
        .iter()
        .find_map(|probe| probe.probe(media).map(|verdict| (verdict, probe.name())))
}
