//! Lyrics and cover enrichment from an external lookup service.
//!
//! # Architecture
//!
//! - **Domain models** (`domain.rs`) - queries, fetched covers, errors
//! - **Client** (`client.rs`) - HTTP client for the lookup service
//! - **Traits** (`traits.rs`) - the provider seam, mocked in tests
//! - **Service** (`service.rs`) - turns lookups into sidecar files
//!
//! Lookups are best effort. A miss leaves the field unresolved until the
//! next pass; nothing is retried within a pass.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use enrichment::{EnrichmentService, LyricsApiClient};
//!
//! let client = LyricsApiClient::new("https://api.lrc.cx", Duration::from_secs(30))?;
//! let service = EnrichmentService::new(Arc::new(client), "/music");
//!
//! let outcome = service.enrich_record(&mut record).await;
//! ```

pub mod client;
pub mod domain;
pub mod service;
pub mod traits;

pub use client::LyricsApiClient;
pub use domain::{EnrichmentError, FetchedCover, ResolvedSidecars, TrackQuery};
pub use service::{EnrichOutcome, EnrichmentService};
pub use traits::LyricsCoverApi;
