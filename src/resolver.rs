//! Lyrics resolution: concurrent cache probes, remote fallback, write-back.
//!
//! Both candidate cache keys are probed at the same time to hide disk
//! latency; the two probes deliver into separate slots and the
//! artist-qualified result wins deterministically when both hit. On a miss
//! the remote chain runs, and a successful fetch is written back to the cache
//! without blocking the response.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::LyricsCache;
use crate::remote::LyricsSource;

#[derive(Clone)]
pub struct Resolver {
    cache: LyricsCache,
    source: Arc<dyn LyricsSource>,
}

impl Resolver {
    pub fn new(cache: LyricsCache, source: Arc<dyn LyricsSource>) -> Self {
        Self { cache, source }
    }

    /// Resolve lyrics for a query. `None` is the single not-found outcome;
    /// internal cache and remote errors are logged here and never surfaced.
    pub async fn resolve(&self, artist: &str, title: &str) -> Option<String> {
        // An unusable title means neither a cache key nor a remote search
        // term exists.
        let title_path = self.cache.title_path(title)?;
        let artist_path = self.cache.artist_title_path(artist, title);

        let (by_artist_title, by_title) = tokio::join!(
            self.probe(artist_path.clone()),
            self.probe(Some(title_path.clone())),
        );

        // Artist-qualified content is the more specific match and always
        // wins when both probes hit.
        if let Some(content) = by_artist_title.or(by_title) {
            tracing::debug!("Cache hit for '{}' - '{}'", artist, title);
            return Some(content);
        }

        let lyrics = match self.source.fetch(title, artist).await {
            Ok(Some(lyrics)) if !lyrics.is_empty() => lyrics,
            Ok(_) => {
                tracing::debug!("No remote lyrics for '{}' - '{}'", artist, title);
                return None;
            }
            Err(e) => {
                tracing::warn!("Remote lyrics fetch failed for '{}': {}", title, e);
                return None;
            }
        };

        self.schedule_write_back(artist_path.unwrap_or(title_path), lyrics.clone());
        Some(lyrics)
    }

    async fn probe(&self, path: Option<PathBuf>) -> Option<String> {
        let path = path?;
        match self.cache.read(&path).await {
            Ok(content) => content,
            Err(e) => {
                // Unexpected I/O or encoding failure; treat as a miss
                tracing::warn!("Cache probe failed for {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Fire-and-forget cache population. The response never waits on this
    /// and its failure is only reported locally.
    fn schedule_write_back(&self, path: PathBuf, content: String) {
        let cache = self.cache.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.write(&path, &content).await {
                tracing::warn!("Lyrics write-back to {} failed: {}", path.display(), e);
            }
        });
    }
}
