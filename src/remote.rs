//! Remote lyrics lookup against the Kugou service.
//!
//! Three sequential calls: song search → lyrics candidate listing → download.
//! Each step feeds the next; the first empty result short-circuits to "not
//! found" and any transport or decode failure is an error the resolver
//! collapses. Endpoint paths, query parameter names, and response field names
//! are an external contract and must not change.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::Result;

const SEARCH_URL: &str = "http://mobilecdn.kugou.com/api/v3/search/song";
const CANDIDATES_URL: &str = "https://krcs.kugou.com/search";
const DOWNLOAD_URL: &str = "https://lyrics.kugou.com/download";

/// Seam for the resolver: anything that can turn (title, artist) into lyrics
/// text. `Ok(None)` means the source has no match.
#[async_trait]
pub trait LyricsSource: Send + Sync {
    async fn fetch(&self, title: &str, artist: &str) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: SearchData,
}

#[derive(Debug, Deserialize, Default)]
struct SearchData {
    #[serde(default)]
    info: Vec<SongInfo>,
}

#[derive(Debug, Deserialize)]
struct SongInfo {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct CandidateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    id: String,
    accesskey: String,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    #[serde(default)]
    content: String,
}

/// Client for the Kugou lyrics chain.
///
/// TLS certificate verification stays at reqwest's default (enabled). The
/// original service had no request timeout; the 10 s bound here is a
/// deliberate robustness addition.
pub struct KugouClient {
    client: Client,
    search_url: String,
    candidates_url: String,
    download_url: String,
}

impl KugouClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoints(SEARCH_URL, CANDIDATES_URL, DOWNLOAD_URL)
    }

    /// Point all three steps at an alternate base. Used by tests to drive the
    /// chain against a local stub server.
    #[doc(hidden)]
    pub fn with_endpoints(
        search_url: impl Into<String>,
        candidates_url: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            search_url: search_url.into(),
            candidates_url: candidates_url.into(),
            download_url: download_url.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let body = self.client.get(url).query(query).send().await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn search_song(&self, keyword: &str) -> Result<Option<String>> {
        let response: SearchResponse = self
            .get_json(
                &self.search_url,
                &[
                    ("format", "json"),
                    ("keyword", keyword),
                    ("page", "1"),
                    ("pagesize", "2"),
                    ("showtype", "1"),
                ],
            )
            .await?;

        Ok(response.data.info.into_iter().next().map(|song| song.hash))
    }

    async fn list_candidates(&self, hash: &str) -> Result<Option<Candidate>> {
        let response: CandidateResponse = self
            .get_json(
                &self.candidates_url,
                &[
                    ("ver", "1"),
                    ("man", "yes"),
                    ("client", "mobi"),
                    ("keyword", ""),
                    ("duration", ""),
                    ("hash", hash),
                    ("album_audio_id", ""),
                ],
            )
            .await?;

        Ok(response.candidates.into_iter().next())
    }

    async fn download(&self, candidate: &Candidate) -> Result<String> {
        let response: DownloadResponse = self
            .get_json(
                &self.download_url,
                &[
                    ("ver", "1"),
                    ("client", "pc"),
                    ("id", candidate.id.as_str()),
                    ("accesskey", candidate.accesskey.as_str()),
                    ("fmt", "lrc"),
                    ("charset", "utf8"),
                ],
            )
            .await?;

        let decoded = general_purpose::STANDARD.decode(response.content)?;
        Ok(String::from_utf8(decoded)?)
    }
}

#[async_trait]
impl LyricsSource for KugouClient {
    async fn fetch(&self, title: &str, artist: &str) -> Result<Option<String>> {
        if title.is_empty() {
            return Ok(None);
        }

        // The upstream search API expects title and artist concatenated with
        // no separator.
        let keyword = format!("{title}{artist}");

        let Some(hash) = self.search_song(&keyword).await? else {
            tracing::debug!("No song found for keyword: {}", keyword);
            return Ok(None);
        };

        let Some(candidate) = self.list_candidates(&hash).await? else {
            tracing::debug!("No lyrics candidates for hash: {}", hash);
            return Ok(None);
        };

        let lyrics = self.download(&candidate).await?;
        tracing::debug!(
            "Downloaded {} bytes of lyrics for '{}'",
            lyrics.len(),
            title
        );
        Ok(Some(lyrics))
    }
}
