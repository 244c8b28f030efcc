//! Title/artist inference from file names.
//!
//! Used when the tags carry no title. `"Artist - Song Title.mp3"` becomes
//! artist `Artist`, title `Song Title`; anything without the `" - "`
//! separator becomes the title as a whole.

use std::path::Path;

use crate::error::{Error, Result};

/// Separator between artist and title in a file name.
pub const SEPARATOR: &str = " - ";

/// Names recovered from a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredNames {
    /// Only set when the name had an artist part
    pub artist: Option<String>,
    pub title: String,
}

/// Split a file name at its last dot.
///
/// The extension keeps its dot. A name starting with a dot and containing no
/// other (".mp3") is all extension and has an empty stem.
pub fn split_extension(file_name: &str) -> (&str, Option<&str>) {
    match file_name.rfind('.') {
        Some(idx) => (&file_name[..idx], Some(&file_name[idx..])),
        None => (file_name, None),
    }
}

/// Infer names from an already extension-less stem.
///
/// Returns `None` for an empty stem.
pub fn infer_from_stem(stem: &str) -> Option<InferredNames> {
    if stem.is_empty() {
        return None;
    }

    let parts: Vec<&str> = stem.split(SEPARATOR).collect();
    if parts.len() >= 2 {
        Some(InferredNames {
            artist: Some(parts[0].to_string()),
            title: parts[1..].join(SEPARATOR),
        })
    } else {
        Some(InferredNames {
            artist: None,
            title: stem.to_string(),
        })
    }
}

/// Infer names from the file name of `path`.
///
/// # Errors
///
/// [`Error::InvalidFilename`] when the name is empty once the extension is
/// stripped.
pub fn infer_from_path(path: &Path) -> Result<InferredNames> {
    // Bytes that are not UTF-8 become U+FFFD; the title only needs to be readable
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let (stem, _) = split_extension(&file_name);

    infer_from_stem(stem).ok_or_else(|| Error::InvalidFilename(path.to_path_buf()))
}
