use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::SongInfo;
use crate::sources::{self, format_duration, MusicSource};

const SEARCH_URL: &str = "http://search.kuwo.cn/r.s";

/// Kuwo search client. Search goes through the legacy `r.s` JSON endpoint;
/// the download URL points at the `anti.s` converter, which answers the GET
/// with the media stream itself, so no second resolution step is needed.
pub struct KuwoMusicClient {
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    abslist: Vec<KuwoSong>,
}

#[derive(Deserialize)]
struct KuwoSong {
    #[serde(rename = "SONGNAME", default)]
    song_name: String,
    #[serde(rename = "ARTIST", default)]
    artist: String,
    #[serde(rename = "ALBUM", default)]
    album: String,
    /// Track length in seconds, as a string.
    #[serde(rename = "DURATION", default)]
    duration: String,
    /// Resource id of the form "MUSIC_12345678".
    #[serde(rename = "MUSICRID", default)]
    music_rid: String,
}

impl KuwoMusicClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: sources::http_client()?,
        })
    }

    fn convert_song(song: &KuwoSong) -> Option<SongInfo> {
        let rid = song.music_rid.strip_prefix("MUSIC_")?;
        if rid.is_empty() {
            return None;
        }

        let seconds = song.duration.parse::<u64>().unwrap_or(0);
        let download_url = format!(
            "http://antiserver.kuwo.cn/anti.s?type=convert_url&rid=MUSIC_{rid}&format=mp3&response=res"
        );

        Some(SongInfo {
            singers: song.artist.clone(),
            song_name: song.song_name.clone(),
            // The search endpoint does not report a size.
            file_size: "-".to_string(),
            duration: format_duration(seconds),
            album: song.album.clone(),
            source: "KuwoMusicClient".to_string(),
            download_url,
            ext: "mp3".to_string(),
            ..Default::default()
        })
    }
}

fn parse_search(body: &str) -> Result<Vec<SongInfo>> {
    let resp: SearchResponse =
        serde_json::from_str(body).context("Failed to parse Kuwo search response")?;
    Ok(resp
        .abslist
        .iter()
        .filter_map(KuwoMusicClient::convert_song)
        .collect())
}

impl MusicSource for KuwoMusicClient {
    fn name(&self) -> &str {
        "KuwoMusicClient"
    }

    fn search(&self, keyword: &str) -> Result<Vec<SongInfo>> {
        let body = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("all", keyword),
                ("ft", "music"),
                ("itemset", "web_2013"),
                ("client", "kt"),
                ("pn", "0"),
                ("rn", "10"),
                ("rformat", "json"),
                ("encoding", "utf8"),
            ])
            .send()
            .context("Kuwo search request failed")?
            .error_for_status()
            .context("Kuwo search returned an error status")?
            .text()
            .context("Failed to read Kuwo search response")?;

        // The endpoint emits JavaScript-flavored JSON with single quotes.
        parse_search(&body.replace('\'', "\""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "abslist": [
            {
                "SONGNAME": "晴天",
                "ARTIST": "周杰伦",
                "ALBUM": "叶惠美",
                "DURATION": "269",
                "MUSICRID": "MUSIC_192681"
            },
            {
                "SONGNAME": "broken entry",
                "ARTIST": "x",
                "ALBUM": "",
                "DURATION": "abc",
                "MUSICRID": ""
            }
        ]
    }"#;

    #[test]
    fn parses_search_response_and_skips_entries_without_rid() {
        let songs = parse_search(FIXTURE).unwrap();
        assert_eq!(songs.len(), 1);

        let song = &songs[0];
        assert_eq!(song.song_name, "晴天");
        assert_eq!(song.singers, "周杰伦");
        assert_eq!(song.duration, "4:29");
        assert_eq!(song.file_size, "-");
        assert_eq!(song.ext, "mp3");
        assert!(song.download_url.contains("rid=MUSIC_192681"));
    }

    #[test]
    fn unparsable_duration_falls_back_to_zero() {
        let body = r#"{"abslist":[{"SONGNAME":"s","ARTIST":"a","ALBUM":"","DURATION":"abc","MUSICRID":"MUSIC_1"}]}"#;
        let songs = parse_search(body).unwrap();
        assert_eq!(songs[0].duration, "0:00");
    }

    /// Live search against the real service.
    /// Run with: cargo test kuwo -- --ignored
    #[test]
    #[ignore]
    fn live_search() {
        let client = KuwoMusicClient::new().unwrap();
        let songs = client.search("晴天").unwrap();
        assert!(!songs.is_empty());
    }
}
