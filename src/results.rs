use std::collections::HashMap;

use crate::models::{SearchResults, SongInfo};

/// Flat, row-indexed view over a grouped search response.
///
/// Rows are laid out in (source, within-source) order and indexed from 0
/// with no gaps. The lookup map is keyed by the string form of the row
/// index, which is what the table selection hands back.
/// Rebuilt wholesale after every search, never patched in place.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    rows: Vec<SongInfo>,
    records: HashMap<String, usize>,
}

impl ResultTable {
    pub fn from_search(results: &SearchResults) -> Self {
        let mut rows = Vec::with_capacity(results.total());
        let mut records = HashMap::with_capacity(results.total());

        for (_, songs) in results.iter() {
            for song in songs {
                records.insert(rows.len().to_string(), rows.len());
                rows.push(song.clone());
            }
        }

        Self { rows, records }
    }

    /// Looks up a record by its row id ("0", "1", ...).
    pub fn get(&self, row_id: &str) -> Option<&SongInfo> {
        self.records.get(row_id).map(|&i| &self.rows[i])
    }

    pub fn rows(&self) -> &[SongInfo] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(source: &str, name: &str) -> SongInfo {
        SongInfo {
            source: source.to_string(),
            song_name: name.to_string(),
            ..Default::default()
        }
    }

    fn sample_results() -> SearchResults {
        let mut results = SearchResults::default();
        results.push(
            "QQMusicClient",
            vec![song("QQMusicClient", "a"), song("QQMusicClient", "b")],
        );
        results.push("KuwoMusicClient", vec![]);
        results.push("NeteaseMusicClient", vec![song("NeteaseMusicClient", "c")]);
        results
    }

    #[test]
    fn row_count_equals_sum_of_per_source_counts() {
        let results = sample_results();
        let table = ResultTable::from_search(&results);
        assert_eq!(table.len(), results.total());
    }

    #[test]
    fn row_ids_are_contiguous_from_zero() {
        let table = ResultTable::from_search(&sample_results());
        for i in 0..table.len() {
            assert!(table.get(&i.to_string()).is_some(), "missing row {}", i);
        }
        assert!(table.get(&table.len().to_string()).is_none());
    }

    #[test]
    fn rows_follow_source_then_within_source_order() {
        let table = ResultTable::from_search(&sample_results());
        let names: Vec<&str> = table.rows().iter().map(|s| s.song_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(table.get("0").unwrap().song_name, "a");
        assert_eq!(table.get("2").unwrap().source, "NeteaseMusicClient");
    }

    #[test]
    fn empty_search_builds_empty_table() {
        let table = ResultTable::from_search(&SearchResults::default());
        assert!(table.is_empty());
        assert!(table.get("0").is_none());
    }

    #[test]
    fn clear_drops_rows_and_lookup() {
        let mut table = ResultTable::from_search(&sample_results());
        table.clear();
        assert!(table.is_empty());
        assert!(table.get("0").is_none());
    }
}
