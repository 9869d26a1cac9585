use anyhow::{Context, Result};
use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::models::SongInfo;
use crate::sources::{self, format_duration, format_size, MusicSource};

const SEARCH_URL: &str = "http://music.163.com/api/cloudsearch/pc";

/// Netease cloudsearch client. Search is a form POST; downloads go through
/// the public outer-url redirector keyed by song id.
pub struct NeteaseMusicClient {
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(default)]
    songs: Vec<NeteaseSong>,
}

#[derive(Deserialize)]
struct NeteaseSong {
    id: u64,
    name: String,
    #[serde(default)]
    ar: Vec<NeteaseArtist>,
    al: NeteaseAlbum,
    /// Track length in milliseconds.
    #[serde(default)]
    dt: u64,
    /// Low-quality stream descriptor; carries the file size.
    l: Option<NeteaseQuality>,
}

#[derive(Deserialize)]
struct NeteaseArtist {
    name: String,
}

#[derive(Deserialize)]
struct NeteaseAlbum {
    name: String,
}

#[derive(Deserialize)]
struct NeteaseQuality {
    #[serde(default)]
    size: u64,
}

impl NeteaseMusicClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: sources::http_client()?,
        })
    }

    fn convert_song(song: &NeteaseSong) -> SongInfo {
        let singers = song
            .ar
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let size = song.l.as_ref().map(|q| q.size).unwrap_or(0);
        let download_url = format!("http://music.163.com/song/media/outer/url?id={}.mp3", song.id);

        SongInfo {
            singers,
            song_name: song.name.clone(),
            file_size: format_size(size),
            duration: format_duration(song.dt / 1000),
            album: song.al.name.clone(),
            source: "NeteaseMusicClient".to_string(),
            download_url,
            ext: "mp3".to_string(),
            ..Default::default()
        }
    }
}

fn parse_search(body: &str) -> Result<Vec<SongInfo>> {
    let resp: SearchResponse =
        serde_json::from_str(body).context("Failed to parse Netease search response")?;
    Ok(resp
        .result
        .songs
        .iter()
        .map(NeteaseMusicClient::convert_song)
        .collect())
}

impl MusicSource for NeteaseMusicClient {
    fn name(&self) -> &str {
        "NeteaseMusicClient"
    }

    fn search(&self, keyword: &str) -> Result<Vec<SongInfo>> {
        let body = self
            .client
            .post(SEARCH_URL)
            .form(&[
                ("s", keyword),
                ("type", "1"),
                ("limit", "10"),
                ("offset", "0"),
            ])
            .send()
            .context("Netease search request failed")?
            .error_for_status()
            .context("Netease search returned an error status")?
            .text()
            .context("Failed to read Netease search response")?;

        parse_search(&body)
    }

    fn download_headers(&self) -> HeaderMap {
        sources::referer_headers("http://music.163.com/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "result": {
            "songs": [
                {
                    "id": 186016,
                    "name": "晴天",
                    "ar": [{"name": "周杰伦"}],
                    "al": {"name": "叶惠美"},
                    "dt": 269000,
                    "l": {"size": 4308992}
                },
                {
                    "id": 1,
                    "name": "no size",
                    "ar": [],
                    "al": {"name": ""},
                    "dt": 0,
                    "l": null
                }
            ]
        }
    }"#;

    #[test]
    fn parses_search_response() {
        let songs = parse_search(FIXTURE).unwrap();
        assert_eq!(songs.len(), 2);

        let song = &songs[0];
        assert_eq!(song.song_name, "晴天");
        assert_eq!(song.singers, "周杰伦");
        assert_eq!(song.album, "叶惠美");
        assert_eq!(song.duration, "4:29");
        assert_eq!(song.file_size, "4.11MB");
        assert_eq!(
            song.download_url,
            "http://music.163.com/song/media/outer/url?id=186016.mp3"
        );
    }

    #[test]
    fn missing_quality_descriptor_reports_no_size() {
        let songs = parse_search(FIXTURE).unwrap();
        assert_eq!(songs[1].file_size, "-");
        assert_eq!(songs[1].singers, "");
        assert_eq!(songs[1].duration, "0:00");
    }

    /// Live search against the real service.
    /// Run with: cargo test netease -- --ignored
    #[test]
    #[ignore]
    fn live_search() {
        let client = NeteaseMusicClient::new().unwrap();
        let songs = client.search("晴天").unwrap();
        assert!(!songs.is_empty());
    }
}
