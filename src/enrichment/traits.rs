//! Trait definition for the lookup service.
//!
//! Lets the scanner and the admin re-resolve path take any provider.
//! Production code uses [`LyricsApiClient`]; tests substitute a scripted
//! implementation.
//!
//! # Example
//!
//! ```ignore
//! use melody_keeper::enrichment::LyricsCoverApi;
//!
//! async fn lookup(api: &dyn LyricsCoverApi, q: &TrackQuery) {
//!     let lyrics = api.fetch_lyrics(q).await;
//! }
//! ```

use async_trait::async_trait;

use super::client::LyricsApiClient;
use super::domain::{EnrichmentError, FetchedCover, TrackQuery};

/// Source of lyrics and cover art for a track.
#[async_trait]
pub trait LyricsCoverApi: Send + Sync {
    /// Fetch LRC lyrics text.
    async fn fetch_lyrics(&self, query: &TrackQuery) -> Result<String, EnrichmentError>;

    /// Fetch cover art bytes and their MIME type.
    async fn fetch_cover(&self, query: &TrackQuery) -> Result<FetchedCover, EnrichmentError>;
}

#[async_trait]
impl LyricsCoverApi for LyricsApiClient {
    async fn fetch_lyrics(&self, query: &TrackQuery) -> Result<String, EnrichmentError> {
        LyricsApiClient::fetch_lyrics(self, query).await
    }

    async fn fetch_cover(&self, query: &TrackQuery) -> Result<FetchedCover, EnrichmentError> {
        LyricsApiClient::fetch_cover(self, query).await
    }
}
