//! Test utilities and fixtures for melody-keeper tests.
//!
//! Common helpers shared by the module tests: a throwaway database, a
//! scan-record factory, a tiny WAV writer (optionally tagged with ID3v2),
//! and a scripted lyrics/cover provider.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{temp_db, mock_scan_record};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (pool, _dir) = temp_db().await;
//!     let record = mock_scan_record("Artist/song.mp3");
//!     // ... test logic
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{Accessor, Tag, TagExt, TagType};
use sqlx::sqlite::SqlitePool;
use tempfile::TempDir;
use tokio::sync::Notify;

use crate::enrichment::{EnrichmentError, FetchedCover, LyricsCoverApi, TrackQuery};
use crate::model::ScanRecord;

/// Creates a temporary database for testing.
///
/// Keep the returned `TempDir` alive for the duration of the test; the
/// database is deleted when it is dropped.
pub async fn temp_db() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_url = crate::db::db_url(&dir.path().join("test.db"));

    let pool = crate::db::init_db(&db_url, 5)
        .await
        .expect("Failed to initialize test database");

    (pool, dir)
}

/// Creates a ScanRecord with sensible defaults and nothing resolved.
///
/// Customize with struct update syntax:
///
/// ```ignore
/// let record = ScanRecord {
///     cover_path: "song.jpg".to_string(),
///     ..mock_scan_record("song.mp3")
/// };
/// ```
pub fn mock_scan_record(rel_path: &str) -> ScanRecord {
    ScanRecord {
        abs_path: PathBuf::from("/music").join(rel_path),
        rel_path: rel_path.to_string(),
        title: "Test Song".to_string(),
        artist: "Test Artist".to_string(),
        album: "Test Album".to_string(),
        duration: 180,
        lyrics_path: String::new(),
        cover_path: String::new(),
    }
}

// ============================================================================
// Audio fixtures
// ============================================================================

/// Sample rate of generated WAV files. Mono 8-bit, so one byte per sample.
pub const WAV_SAMPLE_RATE: u32 = 8000;

/// Write a silent PCM WAV file of the given length.
pub fn write_wav(path: &Path, seconds: u32) {
    let data_len = WAV_SAMPLE_RATE * seconds;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&WAV_SAMPLE_RATE.to_le_bytes());
    bytes.extend_from_slice(&WAV_SAMPLE_RATE.to_le_bytes()); // byte rate
    bytes.extend_from_slice(&1u16.to_le_bytes()); // block align
    bytes.extend_from_slice(&8u16.to_le_bytes()); // bits per sample

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(bytes.len() + data_len as usize, 0x80);

    std::fs::write(path, bytes).expect("Failed to write WAV fixture");
}

/// Tags to embed in a generated WAV file.
#[derive(Debug, Default)]
pub struct TaggedWav<'a> {
    pub seconds: u32,
    pub title: Option<&'a str>,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    /// Raw bytes stored as an image/jpeg front cover
    pub cover_jpeg: Option<&'a [u8]>,
}

/// Write a WAV file and attach an ID3v2 tag with the given fields.
pub fn write_tagged_wav(path: &Path, fixture: &TaggedWav<'_>) {
    write_wav(path, fixture.seconds);

    let mut tag = Tag::new(TagType::Id3v2);
    if let Some(title) = fixture.title {
        tag.set_title(title.to_string());
    }
    if let Some(artist) = fixture.artist {
        tag.set_artist(artist.to_string());
    }
    if let Some(album) = fixture.album {
        tag.set_album(album.to_string());
    }
    if let Some(cover) = fixture.cover_jpeg {
        tag.push_picture(Picture::new_unchecked(
            PictureType::CoverFront,
            Some(MimeType::Jpeg),
            None,
            cover.to_vec(),
        ));
    }

    tag.save_to_path(path, WriteOptions::default())
        .expect("Failed to tag WAV fixture");
}

// ============================================================================
// Scripted enrichment provider
// ============================================================================

/// A [`LyricsCoverApi`] that answers from fixed values and counts calls.
///
/// `None` answers with [`EnrichmentError::Status`] 404.
#[derive(Default)]
pub struct ScriptedApi {
    pub lyrics: Option<String>,
    pub cover: Option<FetchedCover>,
    pub lyrics_calls: AtomicUsize,
    pub cover_calls: AtomicUsize,
    pub queries: Mutex<Vec<TrackQuery>>,
    gate: Option<ApiGate>,
}

/// Lets a test hold a lookup in flight.
#[derive(Clone, Default)]
pub struct ApiGate {
    /// Notified when a lyrics lookup starts
    pub entered: Arc<Notify>,
    /// Notify to let the lookup finish
    pub release: Arc<Notify>,
}

impl ScriptedApi {
    pub fn new(lyrics: Option<&str>, cover: Option<FetchedCover>) -> Self {
        Self {
            lyrics: lyrics.map(str::to_string),
            cover,
            ..Default::default()
        }
    }

    /// Block every lyrics lookup until the gate is released.
    pub fn gated(mut self, gate: ApiGate) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn lyrics_calls(&self) -> usize {
        self.lyrics_calls.load(Ordering::SeqCst)
    }

    pub fn cover_calls(&self) -> usize {
        self.cover_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LyricsCoverApi for ScriptedApi {
    async fn fetch_lyrics(&self, query: &TrackQuery) -> Result<String, EnrichmentError> {
        self.lyrics_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        self.lyrics.clone().ok_or(EnrichmentError::Status(404))
    }

    async fn fetch_cover(&self, query: &TrackQuery) -> Result<FetchedCover, EnrichmentError> {
        self.cover_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());
        self.cover.clone().ok_or(EnrichmentError::Status(404))
    }
}
