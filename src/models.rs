use std::path::PathBuf;

/// One search hit: everything needed to display the track in the results
/// table and to download it later. Immutable once produced by a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongInfo {
    pub singers: String,
    pub song_name: String,
    pub file_size: String,
    pub duration: String,
    pub album: String,
    /// Name of the source client that produced this hit.
    pub source: String,
    pub download_url: String,
    /// Target file extension, without the leading dot.
    pub ext: String,
    /// Directory the file will be written into.
    pub work_dir: PathBuf,
}

impl SongInfo {
    pub fn summary(&self) -> String {
        format!(
            "{} - {} [{}] ({})",
            self.singers, self.song_name, self.album, self.source
        )
    }
}

/// Search results grouped by source, in the order the sources were queried.
/// A plain `HashMap` would lose that order, which the result table depends on.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    groups: Vec<(String, Vec<SongInfo>)>,
}

impl SearchResults {
    pub fn push(&mut self, source: impl Into<String>, songs: Vec<SongInfo>) {
        self.groups.push((source.into(), songs));
    }

    /// Total hit count across all sources.
    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, songs)| songs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SongInfo])> {
        self.groups
            .iter()
            .map(|(source, songs)| (source.as_str(), songs.as_slice()))
    }
}
