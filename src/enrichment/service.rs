//! Enrichment service - fills in missing lyrics and covers from the lookup service
//!
//! Two entry points:
//! 1. [`EnrichmentService::enrich_record`] - scan path; looks up only the
//!    fields a record is missing and never replaces a sidecar on disk
//! 2. [`EnrichmentService::resolve_song`] / [`EnrichmentService::refresh_song`] -
//!    admin path; looks up both fields and replaces existing sidecars

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::db;
use crate::enrichment::domain::{FetchedCover, ResolvedSidecars, TrackQuery};
use crate::enrichment::traits::LyricsCoverApi;
use crate::error::{Error, Result};
use crate::model::{ScanRecord, SongEdit};
use crate::sidecar::{self, SidecarKind, WritePolicy};

/// Which fields one enrichment call resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichOutcome {
    pub lyrics: bool,
    pub cover: bool,
}

impl EnrichOutcome {
    pub fn any(self) -> bool {
        self.lyrics || self.cover
    }
}

/// Looks up and stores lyrics/cover sidecars.
#[derive(Clone)]
pub struct EnrichmentService {
    api: Arc<dyn LyricsCoverApi>,
    music_root: PathBuf,
}

impl EnrichmentService {
    pub fn new(api: Arc<dyn LyricsCoverApi>, music_root: impl Into<PathBuf>) -> Self {
        Self {
            api,
            music_root: music_root.into(),
        }
    }

    /// Look up whatever `record` is still missing and write the sidecars.
    ///
    /// Resolved paths are set on the record. Misses and write failures are
    /// logged and leave the field empty; nothing here touches the database.
    pub async fn enrich_record(&self, record: &mut ScanRecord) -> EnrichOutcome {
        let mut outcome = EnrichOutcome::default();
        if record.is_collect() {
            return outcome;
        }

        let query = TrackQuery::new(&record.title, &record.artist, &record.album);

        if record.missing_lyrics() {
            match self.api.fetch_lyrics(&query).await {
                Ok(lyrics) => {
                    if let Some(rel) = self
                        .store_lyrics(&record.abs_path, lyrics, WritePolicy::KeepExisting)
                        .await
                    {
                        record.lyrics_path = rel;
                        outcome.lyrics = true;
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "enrichment", path = %record.rel_path, error = %e, "Lyrics lookup missed");
                }
            }
        }

        if record.missing_cover() {
            match self.api.fetch_cover(&query).await {
                Ok(cover) => {
                    if let Some(rel) = self
                        .store_cover(&record.abs_path, cover, WritePolicy::KeepExisting)
                        .await
                    {
                        record.cover_path = rel;
                        outcome.cover = true;
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "enrichment", path = %record.rel_path, error = %e, "Cover lookup missed");
                }
            }
        }

        outcome
    }

    /// Fetch lyrics and cover for one song and overwrite its sidecars.
    ///
    /// Both lookups run concurrently. Returned paths are relative to the
    /// music root and empty for a field that could not be resolved.
    pub async fn resolve_song(
        &self,
        title: &str,
        artist: &str,
        album: &str,
        abs_path: &Path,
    ) -> ResolvedSidecars {
        let query = TrackQuery::new(title, artist, album);
        let (lyrics, cover) = tokio::join!(
            self.api.fetch_lyrics(&query),
            self.api.fetch_cover(&query)
        );

        let mut resolved = ResolvedSidecars::default();

        match lyrics {
            Ok(lyrics) => {
                if let Some(rel) = self.store_lyrics(abs_path, lyrics, WritePolicy::Replace).await {
                    resolved.lyrics_path = rel;
                }
            }
            Err(e) => {
                tracing::warn!(target: "enrichment", path = %abs_path.display(), error = %e, "Lyrics lookup missed");
            }
        }

        match cover {
            Ok(cover) => {
                if let Some(rel) = self.store_cover(abs_path, cover, WritePolicy::Replace).await {
                    resolved.cover_path = rel;
                }
            }
            Err(e) => {
                tracing::warn!(target: "enrichment", path = %abs_path.display(), error = %e, "Cover lookup missed");
            }
        }

        resolved
    }

    /// Apply an admin edit and re-resolve the song's sidecars.
    ///
    /// A cover that cannot be fetched leaves the stored one in place.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown ID, [`Error::Database`] on write failure.
    pub async fn refresh_song(
        &self,
        pool: &SqlitePool,
        id: i64,
        edit: &SongEdit,
    ) -> Result<ResolvedSidecars> {
        let song = db::get_song_by_id(pool, id)
            .await?
            .ok_or(Error::NotFound(id))?;

        db::apply_song_edit(pool, id, edit).await?;

        let abs_path = self.music_root.join(&song.file_path);
        let resolved = self
            .resolve_song(&edit.title, &edit.artist, &edit.album, &abs_path)
            .await;

        db::update_sidecars_by_id(pool, id, &resolved.lyrics_path, &resolved.cover_path).await?;

        if resolved.is_empty() {
            tracing::warn!(target: "enrichment", id, "Nothing found for edited song");
        } else {
            tracing::info!(
                target: "enrichment",
                id,
                lyrics = !resolved.lyrics_path.is_empty(),
                cover = !resolved.cover_path.is_empty(),
                "Re-resolved song after edit"
            );
        }

        Ok(resolved)
    }

    async fn store_lyrics(&self, audio: &Path, lyrics: String, policy: WritePolicy) -> Option<String> {
        self.store(audio, SidecarKind::Lyrics, lyrics.into_bytes(), policy)
            .await
    }

    async fn store_cover(
        &self,
        audio: &Path,
        cover: FetchedCover,
        policy: WritePolicy,
    ) -> Option<String> {
        let kind = SidecarKind::cover_for_mime(&cover.mime_type);
        self.store(audio, kind, cover.data, policy).await
    }

    async fn store(
        &self,
        audio: &Path,
        kind: SidecarKind,
        data: Vec<u8>,
        policy: WritePolicy,
    ) -> Option<String> {
        match sidecar::write_sidecar_async(
            self.music_root.clone(),
            audio.to_path_buf(),
            kind,
            data,
            policy,
        )
        .await
        {
            Ok(rel) => Some(rel),
            Err(e) => {
                tracing::warn!(target: "enrichment", path = %audio.display(), error = %e, "Could not store sidecar");
                None
            }
        }
    }
}
