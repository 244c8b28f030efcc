//! Library scanning: directory walk and the scheduled scan orchestrator.
//!
//! The walk itself is synchronous (`walkdir`), so it runs on the blocking
//! pool and hands paths to async code through a bounded channel.

pub mod orchestrator;

pub use orchestrator::{
    LibraryScanner, PassReport, ScanEvent, ScannerConfig, ScannerHandle, ScannerState,
};

use futures::stream::Stream;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use walkdir::WalkDir;

use crate::metadata::filename::split_extension;

/// Case-insensitive allow-list of audio file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioExtensions(Vec<String>);

impl AudioExtensions {
    /// Build from entries like `.mp3` or `MP3`; stored lowercase with a leading dot.
    pub fn new<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            exts.into_iter()
                .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .map(|e| format!(".{e}"))
                .collect(),
        )
    }

    /// A dot-only name like `.mp3` matches too, so the scan can report it
    /// as an invalid file name instead of dropping it.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(file_name) = path.file_name() else {
            return false;
        };
        let file_name = file_name.to_string_lossy();
        let (_, Some(ext)) = split_extension(&file_name) else {
            return false;
        };
        self.0.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext))
    }
}

impl Default for AudioExtensions {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_FORMATS)
    }
}

/// One item yielded by [`walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkItem {
    /// A regular file with an allowed extension
    Audio(PathBuf),
    /// A path that could not be read; its subtree is skipped
    Error { path: PathBuf, message: String },
}

/// Walks `root` recursively and yields matching audio files.
///
/// Traversal errors are yielded as [`WalkItem::Error`] and the walk goes on
/// with the next entry. Dropping the stream stops the walk.
pub fn walk(root: PathBuf, extensions: AudioExtensions) -> impl Stream<Item = WalkItem> {
    let (tx, rx) = mpsc::channel(100);

    tokio::task::spawn_blocking(move || {
        for entry in WalkDir::new(&root) {
            let item = match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() || !extensions.matches(entry.path()) {
                        continue;
                    }
                    WalkItem::Audio(entry.into_path())
                }
                Err(e) => WalkItem::Error {
                    path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone()),
                    message: e.to_string(),
                },
            };

            // Receiver gone: the pass was cancelled
            if tx.blocking_send(item).is_err() {
                break;
            }
        }
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
}
