pub mod kuwo;
pub mod netease;
pub mod qianqian;
pub mod qq;

use std::path::{Path, PathBuf};

use anyhow::Result;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};

use crate::models::{SearchResults, SongInfo};

/// Source names in the order they appear in the search form.
pub const SOURCE_NAMES: &[&str] = &[
    "QQMusicClient",
    "KuwoMusicClient",
    "NeteaseMusicClient",
    "QianqianMusicClient",
];

pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One music-service backend. Implementations own the transport details of
/// their service; callers only see search hits and download headers.
pub trait MusicSource {
    fn name(&self) -> &str;

    /// Searches the service for `keyword`.
    fn search(&self, keyword: &str) -> Result<Vec<SongInfo>>;

    /// Headers the download GET must carry for this service.
    fn download_headers(&self) -> HeaderMap {
        default_headers()
    }
}

pub(crate) fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers
}

pub(crate) fn referer_headers(referer: &'static str) -> HeaderMap {
    let mut headers = default_headers();
    headers.insert(REFERER, HeaderValue::from_static(referer));
    headers
}

/// Builds a blocking HTTP client with the shared browser user agent.
pub(crate) fn http_client() -> Result<reqwest::blocking::Client> {
    use anyhow::Context;
    reqwest::blocking::Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Aggregate over the selected source backends. Fans a search out to each
/// of them in order and groups the hits per source.
pub struct MusicClient {
    sources: Vec<Box<dyn MusicSource + Send + Sync>>,
    work_dir: PathBuf,
}

impl std::fmt::Debug for MusicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicClient")
            .field("work_dir", &self.work_dir)
            .finish_non_exhaustive()
    }
}

impl MusicClient {
    /// Constructs the clients for `names`. Unknown names and client
    /// construction failures surface here, before any task is spawned.
    pub fn new(names: &[String], work_dir: &Path) -> Result<Self> {
        let mut sources: Vec<Box<dyn MusicSource + Send + Sync>> = Vec::new();
        for name in names {
            match name.as_str() {
                "QQMusicClient" => sources.push(Box::new(qq::QQMusicClient::new()?)),
                "KuwoMusicClient" => sources.push(Box::new(kuwo::KuwoMusicClient::new()?)),
                "NeteaseMusicClient" => {
                    sources.push(Box::new(netease::NeteaseMusicClient::new()?))
                }
                "QianqianMusicClient" => {
                    sources.push(Box::new(qianqian::QianqianMusicClient::new()?))
                }
                other => anyhow::bail!("Unknown music source: {other}"),
            }
        }
        Ok(Self {
            sources,
            work_dir: work_dir.to_path_buf(),
        })
    }

    /// Queries every source in order. A source that fails on its own is
    /// skipped and reported through `note`; the search as a whole fails
    /// only when every selected source failed.
    pub fn search<F>(&self, keyword: &str, mut note: F) -> Result<SearchResults>
    where
        F: FnMut(String),
    {
        let mut results = SearchResults::default();
        let mut failures = Vec::new();

        for source in &self.sources {
            match source.search(keyword) {
                Ok(mut songs) => {
                    for song in &mut songs {
                        song.work_dir = self.work_dir.clone();
                    }
                    note(format!("{}: {} results", source.name(), songs.len()));
                    results.push(source.name(), songs);
                }
                Err(e) => {
                    note(format!("{}: search failed: {e:#}", source.name()));
                    failures.push(format!("{}: {e:#}", source.name()));
                }
            }
        }

        if results.iter().count() == 0 && !failures.is_empty() {
            anyhow::bail!("{}", failures.join("; "));
        }
        Ok(results)
    }

    /// Download headers for the source that produced a record. Falls back
    /// to the shared browser headers for an unknown source name.
    pub fn download_headers(&self, source_name: &str) -> HeaderMap {
        self.sources
            .iter()
            .find(|s| s.name() == source_name)
            .map(|s| s.download_headers())
            .unwrap_or_else(default_headers)
    }
}

/// Formats a track length in seconds as `m:ss`.
pub(crate) fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Formats a byte count the way the results table shows file sizes.
pub(crate) fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "-".to_string();
    }
    format!("{:.2}MB", bytes as f64 / (1024.0 * 1024.0))
}
