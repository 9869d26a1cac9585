use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::models::SongInfo;
use crate::sources::{self, format_duration, format_size, MusicSource};

const SEARCH_URL: &str = "https://c.y.qq.com/soso/fcgi-bin/client_search_cp";

/// QQ music JSON search API client.
pub struct QQMusicClient {
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    data: SearchData,
}

#[derive(Deserialize)]
struct SearchData {
    song: SongList,
}

#[derive(Deserialize)]
struct SongList {
    #[serde(default)]
    list: Vec<QqSong>,
}

#[derive(Deserialize)]
struct QqSong {
    songname: String,
    albumname: String,
    media_mid: String,
    /// Track length in seconds.
    interval: u64,
    /// 128kbps file size in bytes.
    #[serde(default)]
    size128: u64,
    #[serde(default)]
    singer: Vec<QqSinger>,
}

#[derive(Deserialize)]
struct QqSinger {
    name: String,
}

impl QQMusicClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: sources::http_client()?,
        })
    }

    fn convert_song(song: &QqSong) -> SongInfo {
        let singers = song
            .singer
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(",");

        // The C400 (128kbps m4a) stream works without a per-session vkey.
        let download_url = format!(
            "http://dl.stream.qqmusic.qq.com/C400{}.m4a?guid=126548448&vkey=&uin=0&fromtag=66",
            song.media_mid
        );

        SongInfo {
            singers,
            song_name: song.songname.clone(),
            file_size: format_size(song.size128),
            duration: format_duration(song.interval),
            album: song.albumname.clone(),
            source: "QQMusicClient".to_string(),
            download_url,
            ext: "m4a".to_string(),
            ..Default::default()
        }
    }
}

fn parse_search(body: &str) -> Result<Vec<SongInfo>> {
    let resp: SearchResponse =
        serde_json::from_str(body).context("Failed to parse QQ music search response")?;
    Ok(resp
        .data
        .song
        .list
        .iter()
        .map(QQMusicClient::convert_song)
        .collect())
}

impl MusicSource for QQMusicClient {
    fn name(&self) -> &str {
        "QQMusicClient"
    }

    fn search(&self, keyword: &str) -> Result<Vec<SongInfo>> {
        let body = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("w", keyword),
                ("format", "json"),
                ("p", "1"),
                ("n", "10"),
                ("cr", "1"),
            ])
            .send()
            .context("QQ music search request failed")?
            .error_for_status()
            .context("QQ music search returned an error status")?
            .text()
            .context("Failed to read QQ music search response")?;

        parse_search(&body)
    }

    fn download_headers(&self) -> HeaderMap {
        sources::referer_headers("https://y.qq.com/")
    }
}
