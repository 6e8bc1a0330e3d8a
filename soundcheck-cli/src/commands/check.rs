//! Implementation of the 'check' subcommand.
//!
//! Resolves the given paths to video files, builds a detector from the
//! environment and the command-line options, checks the files in small
//! concurrent batches and prints one result per file.

use crate::cli::CheckArgs;
use crate::error::{CliErrorContext, CliResult};
use crate::output::{create_spinner, print_failure, print_info, print_section, print_success, print_warning};

use soundcheck_core::media::AudioTrack;
use soundcheck_core::{
    AudioPresenceDetector, CheckState, CoreError, DetectionError, Detection, DetectorConfig,
    DetectorConfigBuilder, ProbeKind, StatusView, VideoFile, find_video_files, format_bytes, format_elapsed,
};

use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Every checked file has audio.
pub const EXIT_ALL_AUDIO: i32 = 0;
/// At least one file has no audio, and nothing failed.
pub const EXIT_SOME_SILENT: i32 = 1;
/// At least one check failed, or the run could not start.
pub const EXIT_FAILED: i32 = 2;

/// Number of files checked concurrently.
const CHECK_BATCH_SIZE: usize = 4;

/// A command-line path resolved to something checkable, or the reason it
/// cannot be checked.
#[derive(Debug)]
pub enum CheckInput {
    File(PathBuf),
    Rejected { path: PathBuf, error: CoreError },
}

/// Expands directories to their top-level video files (by extension) and
/// rejects explicit paths that are missing or not videos. Order follows the
/// arguments.
pub fn discover_check_files(paths: &[PathBuf]) -> Vec<CheckInput> {
    let mut inputs = Vec::new();
    for path in paths {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                inputs.push(CheckInput::Rejected {
                    path: path.clone(),
                    error: CoreError::PathError(format!(
                        "Invalid input path '{}': {}",
                        path.display(),
                        e
                    )),
                });
                continue;
            }
        };

        if metadata.is_dir() {
            match find_video_files(path) {
                Ok(files) => inputs.extend(files.into_iter().map(CheckInput::File)),
                Err(CoreError::NoFilesFound) => inputs.push(CheckInput::Rejected {
                    path: path.clone(),
                    error: CoreError::PathError(format!(
                        "No video files found in '{}'",
                        path.display()
                    )),
                }),
                Err(error) => inputs.push(CheckInput::Rejected {
                    path: path.clone(),
                    error,
                }),
            }
        } else {
            // Explicit files are judged by extension, then by their leading bytes
            match VideoFile::open(path) {
                Ok(file) if file.is_video() => inputs.push(CheckInput::File(path.clone())),
                Ok(_) => inputs.push(CheckInput::Rejected {
                    path: path.clone(),
                    error: CoreError::NotAVideo(path.display().to_string()),
                }),
                Err(error) => inputs.push(CheckInput::Rejected {
                    path: path.clone(),
                    error,
                }),
            }
        }
    }
    inputs
}

/// Detector configuration: defaults, then `SOUNDCHECK_*` variables, then flags.
pub fn build_config(args: &CheckArgs) -> CliResult<DetectorConfig> {
    let mut builder = DetectorConfigBuilder::from_config(DetectorConfig::from_env()?);

    if let Some(backend) = args.backend {
        builder = builder.backend(backend);
    }
    if let Some(probes) = &args.probes {
        builder = builder.probes(ProbeKind::parse_list(probes)?);
    }
    if let Some(dir) = &args.temp_dir {
        builder = builder.temp_dir(dir.clone());
    }
    if let Some(secs) = args.decode_window {
        builder = builder.decode_window_secs(secs);
    }
    Ok(builder.build())
}

/// One line of `--json` output.
#[derive(Debug, Clone, Serialize)]
pub struct CheckRecord {
    pub path: String,
    #[serde(flatten)]
    pub status: StatusView,
    pub has_audio: Option<bool>,
    pub decided_by: Option<&'static str>,
    pub backend: Option<&'static str>,
    pub audio_tracks: Option<Vec<AudioTrack>>,
}

impl CheckRecord {
    fn from_detection(path: &Path, result: Result<Detection, DetectionError>) -> Self {
        match result {
            Ok(detection) => Self {
                path: path.display().to_string(),
                status: StatusView::from_result(&detection.file, &Ok(detection.has_audio)),
                has_audio: Some(detection.has_audio),
                decided_by: Some(detection.decided_by),
                backend: Some(detection.backend),
                audio_tracks: detection.media.audio_tracks,
            },
            Err(e) => {
                let name = e.file().to_string();
                Self {
                    path: path.display().to_string(),
                    status: StatusView::from_result(name, &Err(e)),
                    has_audio: None,
                    decided_by: None,
                    backend: None,
                    audio_tracks: None,
                }
            }
        }
    }

    fn rejected(path: &Path, error: &CoreError) -> Self {
        let mut status = StatusView::selected(path.display().to_string());
        status.error = Some(error.to_string());
        Self {
            path: path.display().to_string(),
            status,
            has_audio: None,
            decided_by: None,
            backend: None,
            audio_tracks: None,
        }
    }
}

/// Totals for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub with_audio: usize,
    pub without_audio: usize,
    pub failed: usize,
}

impl CheckSummary {
    fn record(&mut self, record: &CheckRecord) {
        match record.has_audio {
            Some(true) => self.with_audio += 1,
            Some(false) => self.without_audio += 1,
            None => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.with_audio + self.without_audio + self.failed
    }

    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 {
            EXIT_FAILED
        } else if self.without_audio > 0 {
            EXIT_SOME_SILENT
        } else {
            EXIT_ALL_AUDIO
        }
    }
}

/// Runs the check command and returns the totals. Per-file failures are
/// reported in the output and counted; only setup failures are errors.
pub async fn run_check(args: &CheckArgs, verbose: bool) -> CliResult<CheckSummary> {
    let start = Instant::now();
    let config = build_config(args)?;
    let detector = AudioPresenceDetector::from_config(&config)?;
    info!(
        "Checking with backend '{}', probes [{}]",
        detector.backend_name(),
        detector.probe_names().join(", ")
    );

    let inputs = discover_check_files(&args.paths);
    debug!("Resolved {} input(s)", inputs.len());

    let mut summary = CheckSummary::default();
    for batch in inputs.chunks(CHECK_BATCH_SIZE) {
        for record in check_batch(&detector, batch, args.json).await {
            summary.record(&record);
            emit(&record, args.json, verbose)?;
        }
    }

    info!(
        "Checked {} file(s): {} with audio, {} without, {} failed",
        summary.total(),
        summary.with_audio,
        summary.without_audio,
        summary.failed
    );
    if !args.json && summary.total() > 1 {
        print_section("Summary");
        print_info("With audio", summary.with_audio);
        print_info("Without audio", summary.without_audio);
        print_info("Failed", summary.failed);
        print_info("Elapsed", format_elapsed(start.elapsed()));
    }
    Ok(summary)
}

async fn check_batch(
    detector: &AudioPresenceDetector,
    batch: &[CheckInput],
    quiet: bool,
) -> Vec<CheckRecord> {
    // Read the batch, keeping a slot per input so output order is preserved
    let mut slots: Vec<Result<PathBuf, CheckRecord>> = Vec::with_capacity(batch.len());
    let mut files = Vec::new();
    for input in batch {
        match input {
            CheckInput::File(path) => {
                match VideoFile::open(path).cli_with_context(|| format!("Reading '{}'", path.display())) {
                    Ok(file) => {
                        debug!("Read {} ({})", path.display(), format_bytes(file.len()));
                        files.push(file);
                        slots.push(Ok(path.clone()));
                    }
                    Err(e) => {
                        warn!("{}", e);
                        slots.push(Err(CheckRecord::rejected(path, &e)));
                    }
                }
            }
            CheckInput::Rejected { path, error } => {
                warn!("Skipping {}: {}", path.display(), error);
                slots.push(Err(CheckRecord::rejected(path, error)));
            }
        }
    }

    let spinner = if quiet || files.is_empty() {
        None
    } else {
        create_spinner(&format!("Checking {} file(s)...", files.len()))
    };
    let mut results = detector.detect_all(&files).await.into_iter();
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    slots
        .into_iter()
        .map(|slot| match slot {
            Ok(path) => match results.next() {
                Some(result) => CheckRecord::from_detection(&path, result),
                None => CheckRecord::rejected(
                    &path,
                    &CoreError::OperationFailed("no result returned for this file".to_string()),
                ),
            },
            Err(record) => record,
        })
        .collect()
}

fn emit(record: &CheckRecord, json: bool, verbose: bool) -> CliResult<()> {
    if json {
        let line = serde_json::to_string(record).map_err(|e| {
            CoreError::OperationFailed(format!("Serializing result for '{}': {}", record.path, e))
        })?;
        println!("{line}");
        return Ok(());
    }

    let message = record.status.error.as_deref().unwrap_or_default();
    match record.status.state {
        CheckState::WithAudio => {
            print_success(&format!(
                "{}: audio found (probe: {}, backend: {})",
                record.path,
                record.decided_by.unwrap_or("-"),
                record.backend.unwrap_or("-")
            ));
            if verbose {
                for track in record.audio_tracks.iter().flatten() {
                    println!("    {track}");
                }
            }
        }
        CheckState::WithoutAudio => print_warning(&format!("{}: {}", record.path, message)),
        CheckState::Idle => print_failure(&format!("{}: {}", record.path, message)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn exit_codes_follow_worst_outcome() {
        let mut summary = CheckSummary {
            with_audio: 3,
            ..Default::default()
        };
        assert_eq!(summary.exit_code(), EXIT_ALL_AUDIO);
        summary.without_audio = 1;
        assert_eq!(summary.exit_code(), EXIT_SOME_SILENT);
        summary.failed = 1;
        assert_eq!(summary.exit_code(), EXIT_FAILED);
        assert_eq!(summary.total(), 5);
    }

    #[test]
    fn discovery_keeps_argument_order_and_rejects_non_videos() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let videos = dir.path().join("videos");
        fs::create_dir(&videos)?;
        File::create(videos.join("b.mkv"))?;
        File::create(videos.join("a.mp4"))?;
        let notes = dir.path().join("notes.txt");
        File::create(&notes)?;
        let single = dir.path().join("single.webm");
        File::create(&single)?;
        let download = dir.path().join("download.bin");
        fs::write(&download, [0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x86, 0x81])?;

        let inputs = discover_check_files(&[
            single.clone(),
            notes.clone(),
            videos.clone(),
            dir.path().join("missing.mp4"),
            download.clone(),
        ]);

        assert_eq!(inputs.len(), 6);
        assert!(matches!(&inputs[0], CheckInput::File(p) if *p == single));
        assert!(matches!(&inputs[1], CheckInput::Rejected { error: CoreError::NotAVideo(_), .. }));
        assert!(matches!(&inputs[2], CheckInput::File(p) if p.ends_with("a.mp4")));
        assert!(matches!(&inputs[3], CheckInput::File(p) if p.ends_with("b.mkv")));
        assert!(matches!(&inputs[4], CheckInput::Rejected { error: CoreError::PathError(_), .. }));
        assert!(matches!(&inputs[5], CheckInput::File(p) if *p == download));
        Ok(())
    }

    #[test]
    fn empty_directory_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let inputs = discover_check_files(&[dir.path().to_path_buf()]);
        match &inputs[..] {
            [CheckInput::Rejected { error, .. }] => {
                assert!(error.to_string().contains("No video files found"))
            }
            other => panic!("unexpected inputs: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn rejected_record_serializes_error() {
        let record = CheckRecord::rejected(
            &PathBuf::from("notes.txt"),
            &CoreError::NotAVideo("notes.txt".to_string()),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["path"], "notes.txt");
        assert_eq!(json["state"], "idle");
        assert_eq!(json["has_audio"], serde_json::Value::Null);
        assert_eq!(json["error"], "'notes.txt' is not a video file");
    }
}
