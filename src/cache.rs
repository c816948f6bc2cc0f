//! Flat-file lyrics cache.
//!
//! One file per song under the configured root: `<dir>/<artist>-<title>.lrc`
//! or `<dir>/<title>.lrc`. Files never expire and are never evicted.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::encoding;
use crate::error::Result;

const LYRIC_EXT: &str = "lrc";

#[derive(Debug, Clone)]
pub struct LyricsCache {
    root: PathBuf,
}

impl LyricsCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path for the artist-qualified key, `<artist>-<title>.lrc`.
    ///
    /// Returns `None` when either component is empty after sanitization, so
    /// callers never probe a degenerate file name like `-.lrc`.
    pub fn artist_title_path(&self, artist: &str, title: &str) -> Option<PathBuf> {
        let artist = sanitize(artist);
        let title = sanitize(title);
        if artist.is_empty() || title.is_empty() {
            return None;
        }
        Some(self.root.join(format!("{artist}-{title}.{LYRIC_EXT}")))
    }

    /// Path for the title-only key, `<title>.lrc`.
    pub fn title_path(&self, title: &str) -> Option<PathBuf> {
        let title = sanitize(title);
        if title.is_empty() {
            return None;
        }
        Some(self.root.join(format!("{title}.{LYRIC_EXT}")))
    }

    /// Read one cache entry, normalizing its encoding.
    ///
    /// A missing file is `Ok(None)`; any other I/O failure is an error so the
    /// caller can log it.
    pub async fn read(&self, path: &Path) -> Result<Option<String>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(encoding::normalize(bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write one cache entry verbatim (content is already UTF-8).
    ///
    /// Writes to a `.tmp` sibling then renames over the target so readers
    /// never observe a partially-written file. Concurrent writers of the same
    /// key are last-write-wins.
    pub async fn write(&self, path: &Path, content: &str) -> Result<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Strip characters that would let artist/title escape the cache root.
fn sanitize(component: &str) -> String {
    component
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect()
}
