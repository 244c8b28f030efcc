//! Read-only catalog handle for the serving layer.
//!
//! Handed out at construction; request handlers never reach the scanner.

use sqlx::SqlitePool;

use crate::db;
use crate::error::{Error, Result};
use crate::model::{Song, SongSummary};

/// Cloneable read interface over the song catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All songs that are not soft-deleted, newest first.
    pub async fn list_songs(&self) -> Result<Vec<SongSummary>> {
        Ok(db::list_songs(&self.pool).await?)
    }

    /// One song by ID. Soft-deleted songs are returned too.
    pub async fn get_song(&self, id: i64) -> Result<Song> {
        db::get_song_by_id(&self.pool, id)
            .await?
            .ok_or(Error::NotFound(id))
    }

    /// Case-insensitive substring match on title, artist or album.
    pub async fn search_songs(&self, query: &str) -> Result<Vec<SongSummary>> {
        Ok(db::search_songs(&self.pool, query.trim()).await?)
    }

    /// One admin page (1-based) and the total number of songs.
    pub async fn list_songs_page(&self, page: u32, page_size: u32) -> Result<(Vec<Song>, i64)> {
        Ok(db::list_songs_page(&self.pool, page, page_size).await?)
    }
}
