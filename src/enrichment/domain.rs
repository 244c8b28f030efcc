//! Internal domain models for lyrics and cover lookups.
//!
//! These types are independent of the lookup service's wire format; the
//! client turns HTTP responses into them.

use std::time::Duration;

/// What a lookup is keyed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackQuery {
    /// Required by the service
    pub title: String,
    /// Sent only when non-empty
    pub artist: String,
    /// Sent only when non-empty
    pub album: String,
}

impl TrackQuery {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
        }
    }
}

/// A cover image downloaded from the lookup service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedCover {
    pub data: Vec<u8>,
    /// From the response's Content-Type; may be empty
    pub mime_type: String,
}

/// Sidecars produced for one song, relative to the music root.
///
/// An empty string means the field stayed unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSidecars {
    pub lyrics_path: String,
    pub cover_path: String,
}

impl ResolvedSidecars {
    pub fn is_empty(&self) -> bool {
        self.lyrics_path.is_empty() && self.cover_path.is_empty()
    }
}

/// A failed lookup.
///
/// Every variant is a miss: the field stays unresolved for this pass and
/// is not retried until the next one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrichmentError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Lookup service answered HTTP {0}")]
    Status(u16),

    #[error("Lookup service returned an empty body")]
    EmptyBody,
}

impl EnrichmentError {
    /// Classify a reqwest failure.
    pub fn from_reqwest(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Network(err.to_string())
        }
    }
}
