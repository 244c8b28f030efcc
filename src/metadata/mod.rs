//! Audio file metadata extraction.
//!
//! Uses the lofty crate for format-independent tag and property access.
//! Tag fields, duration and embedded cover art are read independently: a
//! file with broken properties still yields its tags, and a file lofty
//! cannot parse at all still gets a duration estimated from its size.
//!
//! Nothing here writes to disk. The embedded cover is handed back so the
//! caller can decide where it goes.

pub mod filename;

use lofty::config::{ParseOptions, ParsingMode};
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use std::path::Path;

use crate::error::{Error, Result};

/// Bitrate assumed when a file has to be timed by its size.
pub const DEFAULT_BITRATE_KBPS: u64 = 128;

/// Tag fields the pipeline cares about. Empty tags come back as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFields {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub lyrics: Option<String>,
}

/// Cover art embedded in the file's tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedCover {
    /// MIME type as reported by the tag (image/jpeg, image/png, ...)
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Everything extracted from one audio file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedMetadata {
    pub tags: TagFields,
    /// Whole seconds; 0 when unknown
    pub duration: u64,
    pub cover: Option<EmbeddedCover>,
}

/// Extract tags, duration and embedded cover from an audio file.
///
/// A tag read failure is logged and the file continues with empty tags.
/// When properties are unavailable or report a zero duration, the duration
/// is estimated from the file size (see [`estimate_duration_from_size`]).
///
/// # Errors
///
/// [`Error::MetadataUnreadable`] only when lofty could not parse the file
/// *and* the size-based estimate failed too.
pub fn extract(path: &Path) -> Result<ExtractedMetadata> {
    let probed = read_tagged_file(path);

    let (tags, cover, properties_duration) = match &probed {
        Ok(tagged_file) => (
            tag_fields(tagged_file),
            embedded_cover(tagged_file),
            Some(tagged_file.properties().duration().as_secs()),
        ),
        Err(e) => {
            tracing::warn!(target: "metadata", path = %path.display(), error = %e, "Could not read tags");
            (TagFields::default(), None, None)
        }
    };

    if let Some(secs) = properties_duration.filter(|secs| *secs > 0) {
        return Ok(ExtractedMetadata {
            tags,
            duration: secs,
            cover,
        });
    }

    tracing::warn!(
        target: "metadata",
        path = %path.display(),
        "Properties unreadable or duration is 0, falling back to estimation"
    );

    match estimate_duration_from_size(path) {
        Ok(duration) => Ok(ExtractedMetadata {
            tags,
            duration,
            cover,
        }),
        Err(est_err) => match probed {
            Err(read_err) => Err(Error::metadata(
                path,
                format!("{read_err}; size estimate failed: {est_err}"),
            )),
            // Tags were fine, only timing failed
            Ok(_) => Ok(ExtractedMetadata {
                tags,
                duration: 0,
                cover,
            }),
        },
    }
}

/// Probe and parse a file, retrying in relaxed mode if strict parsing fails.
fn read_tagged_file(path: &Path) -> lofty::error::Result<TaggedFile> {
    match Probe::open(path)?.read() {
        Ok(file) => Ok(file),
        Err(strict_err) => {
            tracing::debug!(target: "metadata", path = %path.display(), error = %strict_err, "Retrying in relaxed mode");
            Probe::open(path)?
                .options(ParseOptions::new().parsing_mode(ParsingMode::Relaxed))
                .read()
        }
    }
}

fn non_empty(value: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn tag_fields(tagged_file: &TaggedFile) -> TagFields {
    let Some(tag) = primary_or_first(tagged_file) else {
        return TagFields::default();
    };

    TagFields {
        title: non_empty(tag.title()),
        artist: non_empty(tag.artist()),
        album: non_empty(tag.album()),
        lyrics: tag
            .get_string(&ItemKey::Lyrics)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string),
    }
}

fn primary_or_first(tagged_file: &TaggedFile) -> Option<&Tag> {
    tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
}

/// Front cover if there is one, otherwise the first picture.
fn embedded_cover(tagged_file: &TaggedFile) -> Option<EmbeddedCover> {
    let pictures = primary_or_first(tagged_file)?.pictures();

    let picture = pictures
        .iter()
        .find(|p| p.pic_type() == lofty::picture::PictureType::CoverFront)
        .or_else(|| pictures.first())?;

    if picture.data().is_empty() {
        return None;
    }

    let mime_type = match picture.mime_type() {
        Some(lofty::picture::MimeType::Jpeg) => "image/jpeg",
        Some(lofty::picture::MimeType::Png) => "image/png",
        Some(lofty::picture::MimeType::Gif) => "image/gif",
        Some(lofty::picture::MimeType::Bmp) => "image/bmp",
        Some(lofty::picture::MimeType::Tiff) => "image/tiff",
        _ => "image/jpeg",
    };

    Some(EmbeddedCover {
        mime_type: mime_type.to_string(),
        data: picture.data().to_vec(),
    })
}

// ============================================================================
// Size-based duration estimate
// ============================================================================

/// Assumed bitrate (kbps) for a file extension, with or without the dot.
///
/// A rough approximation kept stable for compatibility with existing catalogs.
pub fn assumed_bitrate_kbps(extension: &str) -> u64 {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "mp3" | "m4a" | "aac" | "ogg" => 128,
        "flac" => 1000,
        // CD quality: 44.1kHz, 16 bit, stereo
        "wav" => 1411,
        _ => DEFAULT_BITRATE_KBPS,
    }
}

/// `size_bytes * 8 / (bitrate_kbps * 1000)`, truncated to whole seconds.
pub fn estimate_duration(size_bytes: u64, extension: &str) -> u64 {
    let bits = size_bytes.saturating_mul(8);
    bits / (assumed_bitrate_kbps(extension) * 1000)
}

/// Estimate a file's duration from its size on disk.
pub fn estimate_duration_from_size(path: &Path) -> std::io::Result<u64> {
    let size = std::fs::metadata(path)?.len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let (_, extension) = filename::split_extension(&file_name);
    Ok(estimate_duration(size, extension.unwrap_or("")))
}
