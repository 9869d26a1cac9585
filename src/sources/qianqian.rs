use anyhow::{Context, Result};
use scraper::{Html, Selector};

use crate::models::SongInfo;
use crate::sources::{self, MusicSource};

/// Qianqian (taihe) scraping client. The search page embeds a playable
/// stream URL per row, so results are parsed straight out of the HTML.
pub struct QianqianMusicClient {
    client: reqwest::blocking::Client,
}

impl QianqianMusicClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: sources::http_client()?,
        })
    }
}

fn parse_search(html: &str) -> Vec<SongInfo> {
    let document = Html::parse_document(html);

    let item_sel = Selector::parse("div.song-item").unwrap();
    let name_sel = Selector::parse("a.song-name").unwrap();
    let singer_sel = Selector::parse("a.singer-name").unwrap();
    let album_sel = Selector::parse("a.album-name").unwrap();
    let time_sel = Selector::parse("span.song-time").unwrap();

    let mut results = Vec::new();

    for item in document.select(&item_sel) {
        // Rows without an embedded stream URL are not downloadable; skip them.
        let download_url = match item.value().attr("data-playurl") {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => continue,
        };

        let song_name = match item.select(&name_sel).next() {
            Some(el) => el.text().collect::<String>().trim().to_string(),
            None => continue,
        };
        if song_name.is_empty() {
            continue;
        }

        let singers = item
            .select(&singer_sel)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect::<Vec<_>>()
            .join(",");

        let album = item
            .select(&album_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let duration = item
            .select(&time_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| "-".to_string());

        let ext = download_url
            .rsplit('.')
            .next()
            .filter(|ext| ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("mp3")
            .to_string();

        results.push(SongInfo {
            singers,
            song_name,
            // The search page does not show file sizes.
            file_size: "-".to_string(),
            duration,
            album,
            source: "QianqianMusicClient".to_string(),
            download_url,
            ext,
            ..Default::default()
        });
    }

    results
}

impl MusicSource for QianqianMusicClient {
    fn name(&self) -> &str {
        "QianqianMusicClient"
    }

    fn search(&self, keyword: &str) -> Result<Vec<SongInfo>> {
        let html = self
            .client
            .get("https://music.taihe.com/search")
            .query(&[("word", keyword)])
            .send()
            .context("Qianqian search request failed")?
            .error_for_status()
            .context("Qianqian search returned an error status")?
            .text()
            .context("Failed to read Qianqian search response")?;

        Ok(parse_search(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
        <html><body><div class="song-list">
            <div class="song-item" data-playurl="http://audio.taihe.com/612316.m4a">
                <a class="song-name" href="/song/612316">晴天</a>
                <a class="singer-name" href="/artist/2517">周杰伦</a>
                <a class="album-name" href="/album/8220">叶惠美</a>
                <span class="song-time">04:29</span>
            </div>
            <div class="song-item" data-playurl="">
                <a class="song-name" href="/song/1">not downloadable</a>
            </div>
            <div class="song-item" data-playurl="http://audio.taihe.com/7.mp3">
                <a class="song-name" href="/song/7">  两只老虎 </a>
                <a class="singer-name">甲</a>
                <a class="singer-name">乙</a>
            </div>
        </div></body></html>
    "#;

    #[test]
    fn parses_rows_with_stream_urls() {
        let songs = parse_search(FIXTURE);
        assert_eq!(songs.len(), 2);

        let song = &songs[0];
        assert_eq!(song.song_name, "晴天");
        assert_eq!(song.singers, "周杰伦");
        assert_eq!(song.album, "叶惠美");
        assert_eq!(song.duration, "04:29");
        assert_eq!(song.ext, "m4a");
        assert_eq!(song.download_url, "http://audio.taihe.com/612316.m4a");
    }

    #[test]
    fn joins_multiple_singers_and_defaults_missing_fields() {
        let songs = parse_search(FIXTURE);
        let song = &songs[1];
        assert_eq!(song.song_name, "两只老虎");
        assert_eq!(song.singers, "甲,乙");
        assert_eq!(song.album, "");
        assert_eq!(song.duration, "-");
        assert_eq!(song.ext, "mp3");
    }

    #[test]
    fn page_without_results_parses_to_nothing() {
        assert!(parse_search("<html><body>empty</body></html>").is_empty());
    }

    /// Live search against the real site.
    /// Run with: cargo test qianqian -- --ignored
    #[test]
    #[ignore]
    fn live_search() {
        let client = QianqianMusicClient::new().unwrap();
        let songs = client.search("晴天").unwrap();
        println!("{} results", songs.len());
    }
}
