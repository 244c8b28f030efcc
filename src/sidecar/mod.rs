//! Lyrics and cover sidecar files.
//!
//! Sidecars sit next to the audio file and share its basename:
//! - `Song.mp3` -> `Song.lrc` (lyrics)
//! - `Song.mp3` -> `Song.jpg`, or `Song.png` when the source said PNG
//!
//! The scanner never overwrites a sidecar that is already on disk, so
//! hand-curated files survive every pass. Presence is the only check; the
//! content is never compared.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Which sidecar to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidecarKind {
    Lyrics,
    CoverJpeg,
    CoverPng,
}

impl SidecarKind {
    /// Cover kind for a MIME type. Only an explicit PNG gets `.png`.
    pub fn cover_for_mime(mime_type: &str) -> Self {
        if mime_type
            .split(';')
            .next()
            .is_some_and(|m| m.trim().eq_ignore_ascii_case("image/png"))
        {
            Self::CoverPng
        } else {
            Self::CoverJpeg
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Lyrics => "lrc",
            Self::CoverJpeg => "jpg",
            Self::CoverPng => "png",
        }
    }
}

/// What to do when the target sidecar already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Leave the existing file untouched (every scan uses this)
    #[default]
    KeepExisting,
    /// Overwrite; reserved for an explicit metadata edit
    Replace,
}

/// Absolute sidecar path for an audio file.
///
/// Only the extension is swapped, on the raw `OsStr`, so every audio file
/// keeps its own basename. A dot-only name like `.mp3` has no extension to
/// swap and gets `.mp3.lrc`.
pub fn sidecar_path(audio_path: &Path, kind: SidecarKind) -> PathBuf {
    audio_path.with_extension(kind.extension())
}

/// Path of `path` relative to the music root, as stored in the catalog.
///
/// # Errors
///
/// [`Error::OutsideRoot`] when `path` is not under `root`;
/// [`Error::InvalidFilename`] when the relative path is not valid UTF-8,
/// since it could not be stored as a distinct natural key.
pub fn relative_to_root(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).map_err(|_| Error::OutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })?;

    rel.to_str()
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidFilename(path.to_path_buf()))
}

/// Existing lyrics sidecar for an audio file.
pub fn find_lyrics(audio_path: &Path) -> Option<PathBuf> {
    let path = sidecar_path(audio_path, SidecarKind::Lyrics);
    path.is_file().then_some(path)
}

/// Existing cover sidecar, `.jpg` first, then `.png`.
pub fn find_cover(audio_path: &Path) -> Option<PathBuf> {
    [SidecarKind::CoverJpeg, SidecarKind::CoverPng]
        .into_iter()
        .map(|kind| sidecar_path(audio_path, kind))
        .find(|path| path.is_file())
}

/// Write a sidecar next to `audio_path` and return its path relative to `root`.
///
/// With [`WritePolicy::KeepExisting`] an existing file is reported as-is
/// without being opened.
///
/// # Errors
///
/// [`Error::SidecarWrite`] on I/O failure, [`Error::OutsideRoot`] when the
/// audio file is not under `root`.
pub fn write_sidecar(
    root: &Path,
    audio_path: &Path,
    kind: SidecarKind,
    data: &[u8],
    policy: WritePolicy,
) -> Result<String> {
    let target = sidecar_path(audio_path, kind);
    let rel = relative_to_root(root, &target)?;

    if policy == WritePolicy::KeepExisting && target.exists() {
        tracing::debug!(target: "sidecar", path = %target.display(), "Sidecar already present, keeping it");
        return Ok(rel);
    }

    std::fs::write(&target, data).map_err(|e| Error::sidecar(&target, e))?;
    tracing::info!(target: "sidecar", path = %target.display(), bytes = data.len(), "Wrote sidecar");

    Ok(rel)
}

/// [`write_sidecar`] on the blocking pool.
pub async fn write_sidecar_async(
    root: PathBuf,
    audio_path: PathBuf,
    kind: SidecarKind,
    data: Vec<u8>,
    policy: WritePolicy,
) -> Result<String> {
    tokio::task::spawn_blocking(move || write_sidecar(&root, &audio_path, kind, &data, policy))
        .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sidecar_paths() {
        let audio = Path::new("/music/Album/Artist - Song.mp3");
        assert_eq!(
            sidecar_path(audio, SidecarKind::Lyrics),
            PathBuf::from("/music/Album/Artist - Song.lrc")
        );
        assert_eq!(
            sidecar_path(audio, SidecarKind::CoverJpeg),
            PathBuf::from("/music/Album/Artist - Song.jpg")
        );
        assert_eq!(
            sidecar_path(Path::new("/music/a.b.flac"), SidecarKind::CoverPng),
            PathBuf::from("/music/a.b.png")
        );
    }

    #[test]
    fn test_dot_only_name_keeps_its_own_basename() {
        assert_eq!(
            sidecar_path(Path::new("/music/.mp3"), SidecarKind::Lyrics),
            PathBuf::from("/music/.mp3.lrc")
        );
        assert_ne!(
            sidecar_path(Path::new("/music/.mp3"), SidecarKind::CoverJpeg),
            sidecar_path(Path::new("/music/.flac"), SidecarKind::CoverJpeg)
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_get_distinct_sidecars() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = Path::new("/music/Album");
        let alpha = dir.join(OsStr::from_bytes(b"Alpha\xff.wav"));
        let beta = dir.join(OsStr::from_bytes(b"Beta\xfe.wav"));

        let alpha_cover = sidecar_path(&alpha, SidecarKind::CoverJpeg);
        let beta_cover = sidecar_path(&beta, SidecarKind::CoverJpeg);

        assert_ne!(alpha_cover, beta_cover);
        assert_eq!(alpha_cover, dir.join(OsStr::from_bytes(b"Alpha\xff.jpg")));
        assert_eq!(
            sidecar_path(&beta, SidecarKind::Lyrics),
            dir.join(OsStr::from_bytes(b"Beta\xfe.lrc"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_relative_path_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = Path::new("/music");
        let path = root.join(OsStr::from_bytes(b"Alpha\xff.wav"));

        let err = relative_to_root(root, &path).unwrap_err();
        assert!(matches!(err, Error::InvalidFilename(p) if p == path));
    }

    #[test]
    fn test_cover_kind_from_mime() {
        assert_eq!(SidecarKind::cover_for_mime("image/png"), SidecarKind::CoverPng);
        assert_eq!(
            SidecarKind::cover_for_mime("Image/PNG; charset=binary"),
            SidecarKind::CoverPng
        );
        assert_eq!(SidecarKind::cover_for_mime("image/jpeg"), SidecarKind::CoverJpeg);
        assert_eq!(SidecarKind::cover_for_mime("image/webp"), SidecarKind::CoverJpeg);
        assert_eq!(SidecarKind::cover_for_mime(""), SidecarKind::CoverJpeg);
    }

    #[test]
    fn test_write_returns_relative_path() {
        let temp = TempDir::new().unwrap();
        let album = temp.path().join("Album");
        std::fs::create_dir(&album).unwrap();
        let audio = album.join("track.mp3");

        let rel = write_sidecar(
            temp.path(),
            &audio,
            SidecarKind::Lyrics,
            b"[00:01.00]hello",
            WritePolicy::KeepExisting,
        )
        .unwrap();

        assert_eq!(PathBuf::from(&rel), PathBuf::from("Album").join("track.lrc"));
        assert_eq!(
            std::fs::read(album.join("track.lrc")).unwrap(),
            b"[00:01.00]hello"
        );
    }

    #[test]
    fn test_existing_sidecar_is_never_overwritten() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("track.mp3");
        let cover = temp.path().join("track.jpg");
        std::fs::write(&cover, b"curated by hand").unwrap();

        let rel = write_sidecar(
            temp.path(),
            &audio,
            SidecarKind::CoverJpeg,
            b"scraped",
            WritePolicy::KeepExisting,
        )
        .unwrap();

        assert_eq!(rel, "track.jpg");
        assert_eq!(std::fs::read(&cover).unwrap(), b"curated by hand");
    }

    #[test]
    fn test_replace_policy_overwrites() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("track.mp3");
        std::fs::write(temp.path().join("track.lrc"), b"old").unwrap();

        write_sidecar(
            temp.path(),
            &audio,
            SidecarKind::Lyrics,
            b"new",
            WritePolicy::Replace,
        )
        .unwrap();

        assert_eq!(std::fs::read(temp.path().join("track.lrc")).unwrap(), b"new");
    }

    #[test]
    fn test_write_failure_is_sidecar_error() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("missing-dir").join("track.mp3");

        let err = write_sidecar(
            temp.path(),
            &audio,
            SidecarKind::Lyrics,
            b"x",
            WritePolicy::KeepExisting,
        )
        .unwrap_err();
        assert!(matches!(err, Error::SidecarWrite { .. }));
    }

    #[test]
    fn test_outside_root() {
        let err = relative_to_root(Path::new("/music"), Path::new("/other/a.mp3")).unwrap_err();
        assert!(matches!(err, Error::OutsideRoot { .. }));
    }

    #[test]
    fn test_find_existing_sidecars() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("song.flac");

        assert!(find_lyrics(&audio).is_none());
        assert!(find_cover(&audio).is_none());

        std::fs::write(temp.path().join("song.png"), b"png").unwrap();
        std::fs::write(temp.path().join("song.lrc"), b"lrc").unwrap();

        assert_eq!(find_cover(&audio), Some(temp.path().join("song.png")));
        assert_eq!(find_lyrics(&audio), Some(temp.path().join("song.lrc")));

        std::fs::write(temp.path().join("song.jpg"), b"jpg").unwrap();
        assert_eq!(find_cover(&audio), Some(temp.path().join("song.jpg")));
    }

    #[tokio::test]
    async fn test_async_write() {
        let temp = TempDir::new().unwrap();
        let audio = temp.path().join("song.ogg");

        let rel = write_sidecar_async(
            temp.path().to_path_buf(),
            audio,
            SidecarKind::CoverPng,
            vec![0x89, b'P', b'N', b'G'],
            WritePolicy::KeepExisting,
        )
        .await
        .unwrap();

        assert_eq!(rel, "song.png");
        assert!(temp.path().join("song.png").exists());
    }
}
