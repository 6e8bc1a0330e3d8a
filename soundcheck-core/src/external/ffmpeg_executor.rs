// ============================================================================
// soundcheck-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: Audio decode backend and ffmpeg process abstraction
//
// The decode backend asks ffmpeg to decode a short window of the first audio
// stream to raw PCM on stdout and counts the bytes that come back. A file
// without any audio stream makes ffmpeg refuse to create the output, which is
// reported as zero decoded bytes rather than a failure.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active ffmpeg process
// - FfmpegSpawner: Trait for creating new ffmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
// - FfmpegDecodeBackend: MediaBackend exposing the decoded byte count

use crate::backend::MediaBackend;
use crate::error::{MediaLoadError, command_failed_error, command_start_error};
use crate::media::LoadedMedia;
use crate::temp_files::StagedMedia;

use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use std::process::ExitStatus;

const TOOL: &str = "ffmpeg";

/// Output sample rate used for the decode. Only the byte count matters, so
/// the lowest common rate keeps the pipe small.
const DECODE_SAMPLE_RATE: &str = "8000";

/// Printed by ffmpeg when `-vn -sn -dn` leaves nothing to write.
const NO_STREAM_MARKERS: [&str; 2] = [
    "does not contain any stream",
    "Output file is empty, nothing was encoded",
];

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    fn handle_events<F>(&mut self, handler: F) -> Result<(), MediaLoadError>
    where
        F: FnMut(FfmpegEvent) -> Result<(), MediaLoadError>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> Result<ExitStatus, MediaLoadError>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner: Send + Sync {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> Result<Self::Process, MediaLoadError>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> Result<(), MediaLoadError>
    where
        F: FnMut(FfmpegEvent) -> Result<(), MediaLoadError>,
    {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {}", e);
            MediaLoadError::ToolOutput {
                tool: TOOL.to_string(),
                message: e.to_string(),
            }
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> Result<ExitStatus, MediaLoadError> {
        self.0.wait().map_err(MediaLoadError::Io)
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> Result<Self::Process, MediaLoadError> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error(TOOL, e))
    }
}

// --- Decode backend ---

/// Backend that decodes a window of audio and reports how many bytes came out.
#[derive(Debug, Clone)]
pub struct FfmpegDecodeBackend<S: FfmpegSpawner = SidecarSpawner> {
    spawner: S,
    window_secs: u32,
}

impl FfmpegDecodeBackend<SidecarSpawner> {
    pub fn new(window_secs: u32) -> Self {
        Self::with_spawner(SidecarSpawner, window_secs)
    }
}

impl<S: FfmpegSpawner> FfmpegDecodeBackend<S> {
    pub fn with_spawner(spawner: S, window_secs: u32) -> Self {
        Self {
            spawner,
            window_secs,
        }
    }

    pub fn window_secs(&self) -> u32 {
        self.window_secs
    }

    fn build_command(&self, media: &StagedMedia) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new();
        cmd.hide_banner();
        cmd.input(media.path().to_string_lossy().as_ref());
        cmd.args(["-vn", "-sn", "-dn"]);
        cmd.arg("-t");
        cmd.arg(self.window_secs.to_string());
        cmd.args(["-ac", "1", "-ar", DECODE_SAMPLE_RATE, "-f", "s16le"]);
        cmd.output("-");
        cmd
    }
}

impl<S: FfmpegSpawner> MediaBackend for FfmpegDecodeBackend<S> {
    fn name(&self) -> &'static str {
        TOOL
    }

    fn load(&self, media: &StagedMedia) -> Result<LoadedMedia, MediaLoadError> {
        let cmd = self.build_command(media);
        log::debug!("Running audio decode command: {:?}", cmd);

        let mut process = self.spawner.spawn(cmd)?;
        let mut decoded: u64 = 0;
        let mut error_lines: Vec<String> = Vec::new();

        process.handle_events(|event| {
            match event {
                FfmpegEvent::OutputChunk(chunk) => decoded += chunk.len() as u64,
                FfmpegEvent::Error(line)
                | FfmpegEvent::Log(LogLevel::Error, line)
                | FfmpegEvent::Log(LogLevel::Fatal, line) => error_lines.push(line),
                _ => {}
            }
            Ok(())
        })?;

        let status = process.wait()?;
        if !status.success() {
            if error_lines
                .iter()
                .any(|line| NO_STREAM_MARKERS.iter().any(|m| line.contains(m)))
            {
                log::debug!("{} has no audio stream to decode", media.path().display());
                decoded = 0;
            } else {
                log::debug!("ffmpeg decode failed for {}: {}", media.path().display(), status);
                return Err(command_failed_error(TOOL, status, error_lines.join("\n")));
            }
        }

        log::debug!(
            "Decoded {} byte(s) of audio from {}",
            decoded,
            media.path().display()
        );
        Ok(LoadedMedia {
            audio_decoded_bytes: Some(decoded),
            ..Default::default()
        })
    }
}
