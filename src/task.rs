use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::download;
use crate::models::{SearchResults, SongInfo};
use crate::sources::MusicClient;

/// Everything a background task can send back to the interactive thread.
/// Each task emits any number of progress events followed by exactly one
/// terminal event.
#[derive(Debug)]
pub enum TaskEvent {
    /// Timestamped line for the log feed.
    Progress(String),
    /// Download progress for the progress bar, 0..=100.
    DownloadPercent(u8),
    SearchDone(SearchResults),
    SearchFailed(String),
    DownloadDone { name: String, path: PathBuf },
    DownloadFailed(String),
}

/// Single active-instance slot for one task kind. Holds the handle of the
/// running thread; a second spawn while one is live is rejected outright.
/// Only ever touched from the interactive thread, so no locking.
#[derive(Debug, Default)]
pub struct TaskSlot {
    handle: Option<JoinHandle<()>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Runs `f` on a fresh background thread. Returns `false` without
    /// spawning anything if a task of this kind is still active.
    pub fn spawn<F>(&mut self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_running() {
            return false;
        }
        self.handle = Some(std::thread::spawn(f));
        true
    }

    /// Releases the slot after the task's terminal event has been consumed.
    pub fn clear(&mut self) {
        self.handle = None;
    }
}

/// Formats a log feed line with the original's `[HH:MM:SS]` prefix.
pub fn log_line(msg: impl AsRef<str>) -> String {
    format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), msg.as_ref())
}

/// Body of the search task. Emits progress text, then exactly one of
/// `SearchDone` / `SearchFailed`.
pub fn run_search(client: Arc<MusicClient>, keyword: String, tx: Sender<TaskEvent>) {
    let _ = tx.send(TaskEvent::Progress(log_line(format!(
        "Starting search for: {keyword}"
    ))));

    let note_tx = tx.clone();
    let result = client.search(&keyword, |line| {
        let _ = note_tx.send(TaskEvent::Progress(log_line(line)));
    });

    match result {
        Ok(results) => {
            let _ = tx.send(TaskEvent::Progress(log_line(format!(
                "Search completed. Found {} results.",
                results.total()
            ))));
            let _ = tx.send(TaskEvent::SearchDone(results));
        }
        Err(e) => {
            let _ = tx.send(TaskEvent::SearchFailed(format!("Search failed: {e:#}")));
        }
    }
}

/// Body of the download task. Emits progress text and percent events, then
/// exactly one of `DownloadDone` / `DownloadFailed`.
pub fn run_download(
    song: SongInfo,
    headers: HeaderMap,
    timeout: Duration,
    tx: Sender<TaskEvent>,
) {
    let _ = tx.send(TaskEvent::Progress(log_line(format!(
        "Starting download: {}",
        song.song_name
    ))));

    let progress_tx = tx.clone();
    let result = download::download_song(&song, headers, timeout, |ev| {
        if let Some(percent) = ev.percent {
            let _ = progress_tx.send(TaskEvent::DownloadPercent(percent));
            if let Some(total) = ev.total {
                let _ = progress_tx.send(TaskEvent::Progress(log_line(format!(
                    "Downloading... {}% ({}/{} bytes)",
                    percent, ev.downloaded, total
                ))));
            }
        } else {
            let _ = progress_tx.send(TaskEvent::Progress(log_line(format!(
                "Downloading... {} bytes",
                ev.downloaded
            ))));
        }
    });

    match result {
        Ok(path) => {
            let _ = tx.send(TaskEvent::Progress(log_line(format!(
                "Download completed: {}",
                path.display()
            ))));
            let _ = tx.send(TaskEvent::DownloadDone {
                name: song.song_name.clone(),
                path,
            });
        }
        Err(e) => {
            let _ = tx.send(TaskEvent::DownloadFailed(e.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn slot_rejects_second_spawn_while_running() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let mut slot = TaskSlot::new();

        assert!(slot.spawn(move || {
            let _ = release_rx.recv();
        }));
        assert!(slot.is_running());

        // Duplicate invocation returns immediately with no new task.
        assert!(!slot.spawn(|| unreachable!("must not spawn")));

        release_tx.send(()).unwrap();
        while slot.is_running() {
            std::thread::yield_now();
        }
        assert!(slot.spawn(|| {}));
    }

    #[test]
    fn cleared_slot_accepts_a_new_task() {
        let mut slot = TaskSlot::new();
        assert!(slot.spawn(|| {}));
        slot.clear();
        assert!(!slot.is_running());
        assert!(slot.spawn(|| {}));
    }

    #[test]
    fn log_line_is_timestamped() {
        let line = log_line("hello");
        // "[HH:MM:SS] hello"
        assert_eq!(line.len(), "[00:00:00] hello".len());
        assert!(line.starts_with('['));
        assert!(line.ends_with("] hello"));
    }

    #[test]
    fn failed_download_emits_exactly_one_terminal_event() {
        let (tx, rx) = mpsc::channel();
        let song = SongInfo {
            song_name: "x".to_string(),
            download_url: "http://127.0.0.1:1/nothing".to_string(),
            ext: "mp3".to_string(),
            work_dir: std::env::temp_dir(),
            ..Default::default()
        };

        run_download(song, HeaderMap::new(), Duration::from_millis(200), tx);

        let events: Vec<TaskEvent> = rx.try_iter().collect();
        let terminals = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    TaskEvent::DownloadDone { .. } | TaskEvent::DownloadFailed(_)
                )
            })
            .count();
        assert_eq!(terminals, 1);
        assert!(matches!(
            events.last(),
            Some(TaskEvent::DownloadFailed(msg)) if msg.starts_with("Network error:")
        ));
    }
}
