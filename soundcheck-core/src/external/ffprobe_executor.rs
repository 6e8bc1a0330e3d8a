//! ffprobe-backed media backend.
//!
//! Lists the streams of the staged file and reports every audio stream, so
//! it answers both the track-list and the has-audio primitives for any
//! container ffprobe can open.

use crate::backend::MediaBackend;
use crate::error::{MediaLoadError, command_failed_error, command_start_error};
use crate::media::{LoadedMedia, TrackInfo, TrackKind};
use crate::temp_files::StagedMedia;

use ffprobe::{FfProbeError, ffprobe};
use std::io;

/// Backend that asks ffprobe for the stream list.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfprobeBackend;

impl FfprobeBackend {
    pub fn new() -> Self {
        Self
    }
}

impl MediaBackend for FfprobeBackend {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn load(&self, media: &StagedMedia) -> Result<LoadedMedia, MediaLoadError> {
        let path = media.path();
        log::debug!("Running ffprobe (via crate) on: {}", path.display());

        let metadata = ffprobe(path).map_err(|err| {
            log::debug!("ffprobe failed on {}: {:?}", path.display(), err);
            map_ffprobe_error(err)
        })?;

        let tracks: Vec<TrackInfo> = metadata
            .streams
            .iter()
            .map(|s| {
                track_from_stream(
                    s.index,
                    s.codec_type.as_deref(),
                    s.codec_name.as_deref(),
                    s.channels,
                )
            })
            .collect();
        for track in &tracks {
            log::debug!("  stream #{}: {}", track.id, track.kind);
        }

        Ok(LoadedMedia::from_tracks(
            metadata.format.format_name.clone(),
            &tracks,
        ))
    }
}

/// Builds a track from the fields ffprobe reports for one stream.
fn track_from_stream(
    index: i64,
    codec_type: Option<&str>,
    codec_name: Option<&str>,
    channels: Option<i64>,
) -> TrackInfo {
    let kind = codec_type.map(TrackKind::from).unwrap_or(TrackKind::Unknown);
    let mut track = TrackInfo::new(u64::try_from(index).unwrap_or_default(), kind);
    track.codec = codec_name.map(str::to_string);
    if kind == TrackKind::Audio {
        track.channels = channels.and_then(|c| u32::try_from(c).ok()).filter(|c| *c > 0);
    }
    track
}

/// Maps an ffprobe crate error onto a load error.
fn map_ffprobe_error(err: FfProbeError) -> MediaLoadError {
    match err {
        FfProbeError::Io(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
            command_start_error("ffprobe", io_err)
        }
        FfProbeError::Io(io_err) => MediaLoadError::Io(io_err),
        FfProbeError::Status(output) => command_failed_error(
            "ffprobe",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ),
        FfProbeError::Deserialize(err) => MediaLoadError::ToolOutput {
            tool: "ffprobe".to_string(),
            message: format!("failed to parse JSON: {err}"),
        },
        #[allow(unreachable_patterns)]
        other => MediaLoadError::ToolOutput {
            tool: "ffprobe".to_string(),
            message: format!("{other:?}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_map_to_tracks_by_codec_type() {
        let audio = track_from_stream(1, Some("audio"), Some("aac"), Some(6));
        assert_eq!(audio.kind, TrackKind::Audio);
        assert_eq!(audio.codec.as_deref(), Some("aac"));
        assert_eq!(audio.channels, Some(6));

        let video = track_from_stream(0, Some("video"), Some("h264"), Some(0));
        assert_eq!(video.kind, TrackKind::Video);
        assert_eq!(video.channels, None);

        let unknown = track_from_stream(2, None, None, None);
        assert_eq!(unknown.kind, TrackKind::Unknown);

        let media = LoadedMedia::from_tracks("mov,mp4,m4a,3gp,3g2,mj2", &[video, audio, unknown]);
        assert_eq!(media.has_audio, Some(true));
        assert_eq!(media.audio_tracks.map(|t| t.len()), Some(1));
    }

    #[test]
    fn missing_binary_maps_to_tool_start() {
        let err = map_ffprobe_error(FfProbeError::Io(io::Error::from(io::ErrorKind::NotFound)));
        assert!(matches!(err, MediaLoadError::ToolStart { ref tool, .. } if tool == "ffprobe"));
    }

    #[test]
    fn other_io_errors_stay_io() {
        let err = map_ffprobe_error(FfProbeError::Io(io::Error::other("broken pipe")));
        assert!(matches!(err, MediaLoadError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn failed_status_carries_stderr() {
        use std::os::unix::process::ExitStatusExt;
        use std::process::{ExitStatus, Output};

        let output = Output {
            status: ExitStatus::from_raw(1 << 8),
            stdout: Vec::new(),
            stderr: b"x.bin: Invalid data found when processing input\n".to_vec(),
        };
        let err = map_ffprobe_error(FfProbeError::Status(output));
        match err {
            MediaLoadError::ToolFailed { tool, stderr, .. } => {
                assert_eq!(tool, "ffprobe");
                assert!(stderr.ends_with("Invalid data found when processing input"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
