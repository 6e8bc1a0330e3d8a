// soundcheck-core/tests/common/mod.rs
//
// Shared fixtures: minimal container files built in memory, and backends and
// stagers that record what the detector did with them.

#![allow(dead_code)]

use soundcheck_core::error::MediaLoadError;
use soundcheck_core::media::{LoadedMedia, VideoFile};
use soundcheck_core::temp_files::{MediaStager, StagedMedia, TempFileStager};
use soundcheck_core::MediaBackend;

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// --- ISO-BMFF ---

fn mp4_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

fn mp4_trak(id: u32, handler: &[u8; 4], codec: &[u8; 4], channels: u16) -> Vec<u8> {
    let mut tkhd = vec![0u8; 12];
    tkhd.extend_from_slice(&id.to_be_bytes());
    tkhd.extend_from_slice(&[0u8; 64]);

    let mut hdlr = vec![0u8; 8];
    hdlr.extend_from_slice(handler);
    hdlr.extend_from_slice(&[0u8; 13]);

    let mut entry = vec![0u8; 16];
    entry.extend_from_slice(&channels.to_be_bytes());
    entry.extend_from_slice(&[0u8; 10]);
    let mut stsd = vec![0, 0, 0, 0, 0, 0, 0, 1];
    stsd.extend(mp4_box(codec, &entry));

    let stbl = mp4_box(b"stbl", &mp4_box(b"stsd", &stsd));
    let mut mdia = mp4_box(b"hdlr", &hdlr);
    mdia.extend(mp4_box(b"minf", &stbl));

    let mut trak = mp4_box(b"tkhd", &tkhd);
    trak.extend(mp4_box(b"mdia", &mdia));
    mp4_box(b"trak", &trak)
}

fn mp4(traks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = mp4_box(b"ftyp", b"isom\0\0\x02\0isomiso2");
    out.extend(mp4_box(b"moov", &traks.concat()));
    out.extend(mp4_box(b"mdat", &[0u8; 32]));
    out
}

/// MP4 with an H.264 video track and a stereo AAC track.
pub fn mp4_with_audio() -> Vec<u8> {
    mp4(&[
        mp4_trak(1, b"vide", b"avc1", 0),
        mp4_trak(2, b"soun", b"mp4a", 2),
    ])
}

/// MP4 with a single H.264 video track.
pub fn mp4_video_only() -> Vec<u8> {
    mp4(&[mp4_trak(1, b"vide", b"avc1", 0)])
}

/// Starts like an MP4 but has no `moov` box.
pub fn mp4_without_moov() -> Vec<u8> {
    let mut out = mp4_box(b"ftyp", b"isom\0\0\x02\0isomiso2");
    out.extend(mp4_box(b"mdat", &[0u8; 64]));
    out
}

// --- Matroska ---

fn ebml_element(id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out: Vec<u8> = id.to_be_bytes().iter().copied().skip_while(|&b| b == 0).collect();
    out.push(0x01);
    out.extend_from_slice(&(payload.len() as u64).to_be_bytes()[1..]);
    out.extend_from_slice(payload);
    out
}

fn mkv_track(number: u8, track_type: u8, codec: &str) -> Vec<u8> {
    let mut payload = ebml_element(0xD7, &[number]);
    payload.extend(ebml_element(0x83, &[track_type]));
    payload.extend(ebml_element(0x86, codec.as_bytes()));
    if track_type == 2 {
        payload.extend(ebml_element(0xE1, &ebml_element(0x9F, &[2])));
    }
    ebml_element(0xAE, &payload)
}

fn matroska(doc_type: &str, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut out = ebml_element(0x1A45_DFA3, &ebml_element(0x4282, doc_type.as_bytes()));
    out.extend(ebml_element(
        0x1853_8067,
        &ebml_element(0x1654_AE6B, &tracks.concat()),
    ));
    out
}

/// Matroska file with a VP9 video track and an Opus audio track.
pub fn mkv_with_audio() -> Vec<u8> {
    matroska("matroska", &[mkv_track(1, 1, "V_VP9"), mkv_track(2, 2, "A_OPUS")])
}

/// WebM file with a single VP9 video track.
pub fn webm_video_only() -> Vec<u8> {
    matroska("webm", &[mkv_track(1, 1, "V_VP9")])
}

// --- Inputs ---

pub fn video(name: &str, mime_type: &str, bytes: Vec<u8>) -> VideoFile {
    VideoFile::from_bytes(name, mime_type, bytes)
}

// --- Backends ---

/// Answers every load with the same media, exposing whatever it was given.
pub struct FixedBackend(pub LoadedMedia);

impl MediaBackend for FixedBackend {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn load(&self, _media: &StagedMedia) -> Result<LoadedMedia, MediaLoadError> {
        Ok(self.0.clone())
    }
}

/// Panics inside the decoder task.
pub struct PanickingBackend;

impl MediaBackend for PanickingBackend {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn load(&self, _media: &StagedMedia) -> Result<LoadedMedia, MediaLoadError> {
        panic!("decoder crashed");
    }
}

// --- Stagers ---

/// Stages real temporary files and counts how many have been released.
#[derive(Default)]
pub struct CountingStager {
    inner: TempFileStager,
    staged: AtomicUsize,
    released: Arc<AtomicUsize>,
    paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl CountingStager {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: TempFileStager::in_dir(dir),
            ..Default::default()
        }
    }

    pub fn staged(&self) -> usize {
        self.staged.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

impl MediaStager for CountingStager {
    fn stage(&self, file: &VideoFile) -> io::Result<StagedMedia> {
        let staged = self.inner.stage(file)?;
        self.staged.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(staged.path().to_path_buf());

        let released = Arc::clone(&self.released);
        Ok(staged.with_release_hook(Box::new(move |_path| {
            released.fetch_add(1, Ordering::SeqCst);
        })))
    }
}

/// Always fails to stage.
pub struct FailingStager;

impl MediaStager for FailingStager {
    fn stage(&self, _file: &VideoFile) -> io::Result<StagedMedia> {
        Err(io::Error::new(io::ErrorKind::StorageFull, "no space left on device"))
    }
}
