// soundcheck-core/tests/detector_tests.rs

mod common;

use common::*;
use soundcheck_core::error::{DetectionError, MediaLoadError};
use soundcheck_core::media::{LoadedMedia, VideoFile};
use soundcheck_core::{AudioPresenceDetector, ContainerBackend, ProbeKind, probes_for};

use std::sync::Arc;
use tempfile::tempdir;

fn container_detector() -> AudioPresenceDetector {
    AudioPresenceDetector::new(Arc::new(ContainerBackend::new()))
}

#[tokio::test]
async fn test_mp4_with_audio_track() -> Result<(), Box<dyn std::error::Error>> {
    let file = video("clip.mp4", "video/mp4", mp4_with_audio());
    let detection = container_detector().inspect(&file).await?;

    assert!(detection.has_audio);
    assert_eq!(detection.decided_by, "tracks");
    assert_eq!(detection.backend, "container");
    assert_eq!(detection.media.container.as_deref(), Some("mp4"));
    let tracks = detection.media.audio_tracks.expect("track list");
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].codec.as_deref(), Some("mp4a"));
    assert_eq!(tracks[0].channels, Some(2));
    Ok(())
}

#[tokio::test]
async fn test_mp4_video_only_is_false_not_unknown() -> Result<(), Box<dyn std::error::Error>> {
    let file = video("silent.mp4", "video/mp4", mp4_video_only());
    let detection = container_detector().inspect(&file).await?;

    assert!(!detection.has_audio);
    // The empty track list defers; the flag gives the definitive answer.
    assert_eq!(detection.decided_by, "flag");
    Ok(())
}

#[tokio::test]
async fn test_matroska_and_webm() -> Result<(), Box<dyn std::error::Error>> {
    let detector = container_detector();

    let mkv = video("clip.mkv", "video/x-matroska", mkv_with_audio());
    assert!(detector.detect(&mkv).await?);

    let webm = video("clip.webm", "video/webm", webm_video_only());
    let detection = detector.inspect(&webm).await?;
    assert!(!detection.has_audio);
    assert_eq!(detection.media.container.as_deref(), Some("webm"));
    Ok(())
}

#[tokio::test]
async fn test_corrupt_file_is_load_error() {
    let file = video("broken.mp4", "video/mp4", mp4_without_moov());
    let err = container_detector().detect(&file).await.unwrap_err();

    match &err {
        DetectionError::LoadError { file, source } => {
            assert_eq!(file, "broken.mp4");
            assert!(matches!(source, MediaLoadError::Malformed { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.file(), "broken.mp4");
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_unrecognized_bytes_are_load_error() {
    let file = video("notes.mp4", "video/mp4", b"just some text, not a video".to_vec());
    let err = container_detector().detect(&file).await.unwrap_err();
    assert!(matches!(
        err,
        DetectionError::LoadError {
            source: MediaLoadError::UnsupportedFormat,
            ..
        }
    ));
}

#[tokio::test]
async fn test_no_primitives_is_no_detection_method() {
    let detector = AudioPresenceDetector::new(Arc::new(FixedBackend(LoadedMedia::default())));
    let file = video("clip.mp4", "video/mp4", mp4_with_audio());

    let err = detector.detect(&file).await.unwrap_err();
    assert!(matches!(err, DetectionError::NoDetectionMethodAvailable { .. }));
    assert!(err.to_string().contains("clip.mp4"));
}

#[tokio::test]
async fn test_decoded_bytes_decide_when_alone() -> Result<(), Box<dyn std::error::Error>> {
    let file = video("clip.mp4", "video/mp4", Vec::new());

    let silent = AudioPresenceDetector::new(Arc::new(FixedBackend(LoadedMedia {
        audio_decoded_bytes: Some(0),
        ..Default::default()
    })));
    assert!(!silent.detect(&file).await?);

    let loud = AudioPresenceDetector::new(Arc::new(FixedBackend(LoadedMedia {
        audio_decoded_bytes: Some(16_000),
        ..Default::default()
    })));
    assert!(loud.detect(&file).await?);
    Ok(())
}

#[tokio::test]
async fn test_probe_order_is_configurable() -> Result<(), Box<dyn std::error::Error>> {
    let media = LoadedMedia {
        has_audio: Some(true),
        audio_decoded_bytes: Some(0),
        ..Default::default()
    };
    let detector = AudioPresenceDetector::new(Arc::new(FixedBackend(media)))
        .with_probes(probes_for(&[ProbeKind::Decoded, ProbeKind::Flag]));

    let detection = detector.inspect(&video("a.mp4", "video/mp4", Vec::new())).await?;
    assert!(!detection.has_audio);
    assert_eq!(detection.decided_by, "decoded");
    Ok(())
}

#[tokio::test]
async fn test_detection_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let bytes = mp4_with_audio();
    let file = video("clip.mp4", "video/mp4", bytes.clone());
    let detector = container_detector();

    let first = detector.detect(&file).await?;
    let second = detector.detect(&file).await?;
    assert_eq!(first, second);
    assert_eq!(file.bytes(), Some(bytes.as_slice()));
    assert_eq!(file.name(), "clip.mp4");
    Ok(())
}

#[tokio::test]
async fn test_staged_file_released_once_on_success() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let stager = Arc::new(CountingStager::in_dir(dir.path()));
    let detector = container_detector().with_stager(stager.clone());

    detector
        .detect(&video("clip.mp4", "video/mp4", mp4_with_audio()))
        .await?;

    assert_eq!(stager.staged(), 1);
    assert_eq!(stager.released(), 1);
    let paths = stager.paths();
    assert!(paths[0].file_name().unwrap().to_string_lossy().starts_with("soundcheck_"));
    assert!(paths[0].to_string_lossy().ends_with(".mp4"));
    assert!(!paths[0].exists());
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_file_on_disk_is_checked_in_place() -> Result<(), Box<dyn std::error::Error>> {
    let input_dir = tempdir()?;
    let stage_dir = tempdir()?;
    let path = input_dir.path().join("download.bin");
    std::fs::write(&path, mkv_with_audio())?;

    let stager = Arc::new(CountingStager::in_dir(stage_dir.path()));
    let detector = container_detector().with_stager(stager.clone());
    let file = VideoFile::open(&path)?;
    assert_eq!(file.mime_type(), "video/x-matroska");
    assert!(detector.detect(&file).await?);

    // The input is read where it is: nothing copied, nothing deleted
    assert_eq!(stager.paths(), vec![path.clone()]);
    assert_eq!(stager.released(), 1);
    assert_eq!(std::fs::read_dir(stage_dir.path())?.count(), 0);
    assert!(path.exists());
    Ok(())
}

#[tokio::test]
async fn test_staged_file_released_once_on_failure() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let stager = Arc::new(CountingStager::in_dir(dir.path()));
    let detector = container_detector().with_stager(stager.clone());

    let result = detector
        .detect(&video("broken.mp4", "video/mp4", mp4_without_moov()))
        .await;
    assert!(result.is_err());

    let no_method = AudioPresenceDetector::new(Arc::new(FixedBackend(LoadedMedia::default())))
        .with_stager(stager.clone());
    assert!(no_method
        .detect(&video("clip.mp4", "video/mp4", mp4_with_audio()))
        .await
        .is_err());

    assert_eq!(stager.staged(), 2);
    assert_eq!(stager.released(), 2);
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_staged_file_released_once_when_decoder_panics() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let stager = Arc::new(CountingStager::in_dir(dir.path()));
    let detector = AudioPresenceDetector::new(Arc::new(PanickingBackend)).with_stager(stager.clone());

    let err = detector
        .detect(&video("clip.mp4", "video/mp4", mp4_with_audio()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DetectionError::LoadError {
            source: MediaLoadError::Aborted(_),
            ..
        }
    ));

    assert_eq!(stager.staged(), 1);
    assert_eq!(stager.released(), 1);
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_staging_failure_is_load_error() {
    let detector = container_detector().with_stager(Arc::new(FailingStager));
    let err = detector
        .detect(&video("clip.mp4", "video/mp4", mp4_with_audio()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DetectionError::LoadError {
            source: MediaLoadError::Staging(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_detect_all_keeps_input_order() -> Result<(), Box<dyn std::error::Error>> {
    let files = vec![
        video("a.mp4", "video/mp4", mp4_with_audio()),
        video("b.mp4", "video/mp4", mp4_video_only()),
        video("c.mp4", "video/mp4", mp4_without_moov()),
        video("d.mkv", "video/x-matroska", mkv_with_audio()),
    ];

    let results = container_detector().detect_all(&files).await;
    assert_eq!(results.len(), 4);
    assert!(results[0].as_ref().map(|d| d.has_audio).unwrap_or(false));
    assert!(!results[1].as_ref().map(|d| d.has_audio).unwrap_or(true));
    assert_eq!(results[2].as_ref().unwrap_err().file(), "c.mp4");
    assert_eq!(results[3].as_ref().map(|d| d.file.as_str()).ok(), Some("d.mkv"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_detections_are_independent() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let stager = Arc::new(CountingStager::in_dir(dir.path()));
    let detector = container_detector().with_stager(stager.clone());

    let mut handles = Vec::new();
    for i in 0..8 {
        let detector = detector.clone();
        let bytes = if i % 2 == 0 { mp4_with_audio() } else { mp4_video_only() };
        handles.push(tokio::spawn(async move {
            detector
                .detect(&video(&format!("clip{i}.mp4"), "video/mp4", bytes))
                .await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await??, i % 2 == 0);
    }
    assert_eq!(stager.staged(), 8);
    assert_eq!(stager.released(), 8);
    Ok(())
}
