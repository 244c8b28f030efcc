//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`, while
//! CLI/main uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error`]: Top-level error enum for the ingestion pipeline and catalog
//! - Module-specific errors (e.g., [`EnrichmentError`], [`ConfigError`]) for
//!   detailed handling
//!
//! Every variant raised while processing a single file is recoverable: the
//! scanner logs it and moves on to the next file. A unique-key collision on
//! insert is not an error at all; see [`crate::library::Reconciled`].
//!
//! [`EnrichmentError`]: crate::enrichment::EnrichmentError
//! [`ConfigError`]: crate::config::ConfigError

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Neither tags/properties nor the size-based estimate could be read
    #[error("Metadata unreadable for {path}: {message}")]
    MetadataUnreadable { path: PathBuf, message: String },

    /// The file name has no usable stem, or is not valid UTF-8
    #[error("Invalid filename: {0}")]
    InvalidFilename(PathBuf),

    /// A lyrics or cover sidecar could not be written
    #[error("Failed to write sidecar {path}: {source}")]
    SidecarWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be traversed
    #[error("Directory walk error at {path}: {message}")]
    DirectoryWalk { path: PathBuf, message: String },

    /// A pass was requested while another one is in flight
    #[error("A library scan is already running")]
    ScanAlreadyRunning,

    /// Catalog entry not found
    #[error("Song not found: {0}")]
    NotFound(i64),

    /// A path could not be expressed relative to the music root
    #[error("{path} is outside the music root {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// A blocking worker task panicked or was cancelled
    #[error("Background task failed: {0}")]
    TaskJoin(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a metadata error.
    pub fn metadata(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MetadataUnreadable {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a sidecar write error.
    pub fn sidecar(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SidecarWrite {
            path: path.into(),
            source,
        }
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskJoin(e.to_string())
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Database(e).context(ctx))
    }
}
