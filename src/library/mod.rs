//! Per-file ingestion: resolve a file and reconcile it with the catalog.
//!
//! The scan orchestrator drives these functions for every walked file and
//! for every record that goes through enrichment.

pub mod catalog;
pub mod reconcile;
pub mod resolve;

pub use catalog::Catalog;
pub use reconcile::{Reconciled, SkipReason};

use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

use crate::db;
use crate::error::{Result, ResultExt};
use crate::model::ScanRecord;
use crate::sidecar;

/// Result of processing one file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub reconciled: Reconciled,
    /// The resolved record for written rows; `None` when skipped
    pub record: Option<ScanRecord>,
}

/// Resolve one audio file and write it to the catalog.
///
/// Soft-deleted and fully collected rows are skipped before the file is
/// opened.
///
/// # Errors
///
/// Any error is contained to this file; the caller logs it and continues.
pub async fn process_file(pool: &SqlitePool, root: &Path, abs_path: &Path) -> Result<FileOutcome> {
    let rel_path = sidecar::relative_to_root(root, abs_path)?;
    let flags = db::get_song_flags(pool, &rel_path)
        .await
        .with_context(format!("looking up {rel_path}"))?;

    if let Some(reason) = reconcile::skip_reason(flags) {
        tracing::debug!(target: "library", path = %rel_path, ?reason, "Skipping");
        return Ok(FileOutcome {
            reconciled: Reconciled::Skipped(reason),
            record: None,
        });
    }

    let (root_buf, abs_buf): (PathBuf, PathBuf) = (root.to_path_buf(), abs_path.to_path_buf());
    let record =
        tokio::task::spawn_blocking(move || resolve::resolve_file(&root_buf, &abs_buf)).await??;

    let reconciled = reconcile::reconcile(pool, &record, flags).await?;

    Ok(FileOutcome {
        reconciled,
        record: Some(record),
    })
}

/// Persist sidecar paths found by enrichment and recompute `is_collect`.
pub async fn apply_enrichment(pool: &SqlitePool, record: &ScanRecord) -> Result<()> {
    db::update_sidecars(pool, &record.rel_path, &record.lyrics_path, &record.cover_path).await?;
    Ok(())
}
