//! Resolve one audio file into a [`ScanRecord`].
//!
//! Order of precedence for each field:
//! - title/artist/album: tags, then the file name, then placeholders
//! - lyrics: an existing `.lrc`, then the lyrics tag written out as `.lrc`
//! - cover: an existing `.jpg`/`.png`, then the embedded picture written out

use std::path::Path;

use crate::error::Result;
use crate::metadata::{self, ExtractedMetadata, filename};
use crate::model::{ScanRecord, UNKNOWN_TITLE};
use crate::sidecar::{self, SidecarKind, WritePolicy};

/// Extract and resolve a file. Blocking; call from the blocking pool.
///
/// Unreadable metadata is not an error here: the file continues with
/// placeholders and whatever the file name gives.
pub fn resolve_file(root: &Path, abs_path: &Path) -> Result<ScanRecord> {
    let extracted = match metadata::extract(abs_path) {
        Ok(meta) => Some(meta),
        Err(e) => {
            tracing::warn!(target: "library", path = %abs_path.display(), error = %e, "Using default metadata");
            None
        }
    };

    resolve_record(root, abs_path, extracted)
}

/// Build the record from already-extracted metadata.
///
/// # Errors
///
/// [`crate::error::Error::InvalidFilename`] when a title has to come from the
/// file name and the name is empty; [`crate::error::Error::OutsideRoot`] when
/// `abs_path` is not under `root`.
pub fn resolve_record(
    root: &Path,
    abs_path: &Path,
    extracted: Option<ExtractedMetadata>,
) -> Result<ScanRecord> {
    let rel_path = sidecar::relative_to_root(root, abs_path)?;
    let mut record = ScanRecord::new(abs_path.to_path_buf(), rel_path);
    let meta = extracted.unwrap_or_default();

    if let Some(title) = meta.tags.title {
        record.title = title;
    }
    if let Some(artist) = meta.tags.artist {
        record.artist = artist;
    }
    if let Some(album) = meta.tags.album {
        record.album = album;
    }
    record.duration = meta.duration;

    if record.title == UNKNOWN_TITLE {
        let inferred = filename::infer_from_path(abs_path)?;
        record.title = inferred.title;
        if let Some(artist) = inferred.artist {
            record.artist = artist;
        }
    }

    record.lyrics_path = match sidecar::find_lyrics(abs_path) {
        Some(existing) => sidecar::relative_to_root(root, &existing)?,
        None => meta
            .tags
            .lyrics
            .and_then(|lyrics| {
                write_or_warn(root, abs_path, SidecarKind::Lyrics, lyrics.as_bytes())
            })
            .unwrap_or_default(),
    };

    record.cover_path = match sidecar::find_cover(abs_path) {
        Some(existing) => sidecar::relative_to_root(root, &existing)?,
        None => meta
            .cover
            .and_then(|cover| {
                let kind = SidecarKind::cover_for_mime(&cover.mime_type);
                write_or_warn(root, abs_path, kind, &cover.data)
            })
            .unwrap_or_default(),
    };

    Ok(record)
}

/// A failed write leaves the field unresolved for this pass.
fn write_or_warn(root: &Path, audio: &Path, kind: SidecarKind, data: &[u8]) -> Option<String> {
    sidecar::write_sidecar(root, audio, kind, data, WritePolicy::KeepExisting)
        .map_err(|e| {
            tracing::warn!(target: "library", path = %audio.display(), error = %e, "Sidecar not written");
        })
        .ok()
}
