//! Core data models for the music catalog.
//!
//! - [`Song`] - a full row of the `songs` table
//! - [`SongSummary`] - the listing projection handed to the serving layer
//! - [`ScanRecord`] - the in-memory result of resolving one file during a pass
//!
//! # Database Schema
//!
//! `songs` is keyed by `file_path`, the path relative to the music root,
//! which carries a unique index. `play_count` belongs to the serving layer
//! and `is_deleted` to the admin collaborator; the scanner writes neither.

use chrono::NaiveDateTime;
use sqlx::FromRow;
use std::path::PathBuf;

/// Placeholder title when neither tags nor filename give one.
pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Placeholder artist.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
/// Placeholder album.
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// A catalog entry.
#[derive(Debug, Clone, FromRow)]
pub struct Song {
    /// Database ID (auto-generated)
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Duration in whole seconds; 0 means unknown
    pub duration: i64,
    /// Path relative to the music root (unique)
    pub file_path: String,
    /// Relative path of the cover sidecar
    pub cover_image: Option<String>,
    /// Relative path of the lyrics sidecar
    pub lyrics_path: Option<String>,
    pub play_count: i64,
    /// Both lyrics and cover are resolved
    pub is_collect: bool,
    /// Soft-deleted by an admin
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Basic song information for listings and search results.
#[derive(Debug, Clone, FromRow)]
pub struct SongSummary {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: i64,
    pub cover_image: Option<String>,
    pub is_deleted: bool,
    pub updated_at: NaiveDateTime,
}

/// Descriptive fields an admin may overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongEdit {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: i64,
}

/// What a scan resolved for one audio file.
///
/// Sidecar paths are relative to the music root; an empty string means
/// unresolved. Never persisted as-is, the reconciler turns it into an
/// insert or update of a [`Song`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    /// Absolute path of the audio file
    pub abs_path: PathBuf,
    /// Path relative to the music root; the catalog's natural key
    pub rel_path: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration: u64,
    pub lyrics_path: String,
    pub cover_path: String,
}

impl ScanRecord {
    /// A record with placeholder metadata and nothing resolved.
    pub fn new(abs_path: PathBuf, rel_path: String) -> Self {
        Self {
            abs_path,
            rel_path,
            title: UNKNOWN_TITLE.to_string(),
            artist: UNKNOWN_ARTIST.to_string(),
            album: UNKNOWN_ALBUM.to_string(),
            duration: 0,
            lyrics_path: String::new(),
            cover_path: String::new(),
        }
    }

    /// Both sidecars resolved.
    pub fn is_collect(&self) -> bool {
        !self.lyrics_path.is_empty() && !self.cover_path.is_empty()
    }

    pub fn missing_lyrics(&self) -> bool {
        self.lyrics_path.is_empty()
    }

    pub fn missing_cover(&self) -> bool {
        self.cover_path.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_uses_placeholders() {
        let record = ScanRecord::new(PathBuf::from("/music/a.mp3"), "a.mp3".to_string());
        assert_eq!(record.title, UNKNOWN_TITLE);
        assert_eq!(record.artist, UNKNOWN_ARTIST);
        assert_eq!(record.album, UNKNOWN_ALBUM);
        assert_eq!(record.duration, 0);
        assert!(record.missing_lyrics());
        assert!(record.missing_cover());
    }

    #[test]
    fn test_is_collect_requires_both_sidecars() {
        let mut record = ScanRecord::new(PathBuf::from("/music/a.mp3"), "a.mp3".to_string());
        record.lyrics_path = "a.lrc".to_string();
        assert!(!record.is_collect());

        record.cover_path = "a.jpg".to_string();
        assert!(record.is_collect());
    }
}
