use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use egui_extras::{Column, TableBuilder};
use rfd::{MessageDialog, MessageLevel};

use crate::config::Config;
use crate::results::ResultTable;
use crate::sources::{MusicClient, SOURCE_NAMES};
use crate::task::{self, TaskEvent, TaskSlot};

const TABLE_HEADERS: [&str; 7] = [
    "ID", "Singers", "Songname", "Filesize", "Duration", "Album", "Source",
];

pub struct MusicdlApp {
    // Search form
    keyword: String,
    source_checked: Vec<bool>,

    // Results
    table: ResultTable,
    selected_row: Option<usize>,

    // Download feedback
    progress: u8,

    // Log feed and status bar
    log_lines: Vec<String>,
    status: String,

    // Background tasks
    client: Option<Arc<MusicClient>>,
    search_slot: TaskSlot,
    download_slot: TaskSlot,
    tx: mpsc::Sender<TaskEvent>,
    rx: mpsc::Receiver<TaskEvent>,

    config: Config,
}

impl MusicdlApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        Self::setup_cjk_fonts(&cc.egui_ctx);
        Self::from_config(config)
    }

    fn from_config(config: Config) -> Self {
        let (tx, rx) = mpsc::channel();

        let source_checked = SOURCE_NAMES
            .iter()
            .map(|name| config.sources.iter().any(|s| s == name))
            .collect();

        Self {
            keyword: String::new(),
            source_checked,
            table: ResultTable::default(),
            selected_row: None,
            progress: 0,
            log_lines: Vec::new(),
            status: "Ready".to_string(),
            client: None,
            search_slot: TaskSlot::new(),
            download_slot: TaskSlot::new(),
            tx,
            rx,
            config,
        }
    }

    fn setup_cjk_fonts(ctx: &egui::Context) {
        let mut fonts = egui::FontDefinitions::default();

        // Song metadata is mostly CJK; fall back to a system font that has it.
        let font_paths = [
            // macOS
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/STHeiti Light.ttc",
            // Linux
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
        ];

        for path in &font_paths {
            if let Ok(font_data) = std::fs::read(path) {
                fonts
                    .font_data
                    .insert("cjk_font".to_string(), egui::FontData::from_owned(font_data));

                if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Proportional) {
                    family.push("cjk_font".to_string());
                }
                if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Monospace) {
                    family.push("cjk_font".to_string());
                }

                ctx.set_fonts(fonts);
                return;
            }
        }
    }

    fn append_log(&mut self, line: String) {
        self.log_lines.push(line);
    }

    fn warn(&self, message: &str) {
        MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title("Warning")
            .set_description(message)
            .show();
    }

    fn error_dialog(&self, title: &str, message: &str) {
        MessageDialog::new()
            .set_level(MessageLevel::Error)
            .set_title(title)
            .set_description(message)
            .show();
    }

    fn info_dialog(&self, title: &str, message: &str) {
        MessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title(title)
            .set_description(message)
            .show();
    }

    fn selected_sources(&self) -> Vec<String> {
        SOURCE_NAMES
            .iter()
            .zip(&self.source_checked)
            .filter(|(_, &checked)| checked)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Validation guard for the search action. Returns the trimmed keyword
    /// and the selected sources, or the warning to show. Pure with respect
    /// to the UI so the rejection rules are testable on their own.
    fn search_guard(&self) -> Result<(String, Vec<String>), &'static str> {
        if self.search_slot.is_running() {
            return Err("Search is in progress");
        }

        let sources = self.selected_sources();
        if sources.is_empty() {
            return Err("Please select at least one music source");
        }

        let keyword = self.keyword.trim().to_string();
        if keyword.is_empty() {
            return Err("Please enter a keyword");
        }

        Ok((keyword, sources))
    }

    /// Validation guard for downloading one result row: the record must
    /// still be in the table, the client must exist and no download may be
    /// active.
    fn download_guard(&self, row: usize) -> Result<crate::models::SongInfo, &'static str> {
        let Some(song) = self.table.get(&row.to_string()) else {
            return Err("Song information not found");
        };

        if self.download_slot.is_running() {
            return Err("Another download is in progress");
        }

        if self.client.is_none() {
            return Err("Song information not found");
        }

        Ok(song.clone())
    }

    /// Search button handler: validate, reset state, build the client and
    /// spawn the search task.
    fn start_search(&mut self) {
        let (keyword, sources) = match self.search_guard() {
            Ok(validated) => validated,
            Err(message) => {
                self.warn(message);
                return;
            }
        };

        // A new search starts from a clean slate.
        self.table.clear();
        self.selected_row = None;
        self.log_lines.clear();
        self.append_log(task::log_line(format!(
            "Music sources: {}",
            sources.join(", ")
        )));
        self.append_log(task::log_line(format!("Keyword: {keyword}")));

        let client = match MusicClient::new(&sources, &self.config.work_dir) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                self.error_dialog("Error", &format!("Failed to initialize music client:\n{e:#}"));
                return;
            }
        };
        self.append_log(task::log_line("Music client initialized"));
        self.client = Some(client.clone());

        self.status = format!("Searching for: {keyword}");
        let tx = self.tx.clone();
        self.search_slot
            .spawn(move || task::run_search(client, keyword, tx));
    }

    /// Context-menu download handler for one result row.
    fn start_download(&mut self, row: usize) {
        let song = match self.download_guard(row) {
            Ok(song) => song,
            Err(message) => {
                self.warn(message);
                return;
            }
        };

        // Guarded above; a missing client would have been rejected.
        let Some(client) = &self.client else {
            return;
        };
        let headers = client.download_headers(&song.source);
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let name = song.song_name.clone();

        let tx = self.tx.clone();
        self.download_slot
            .spawn(move || task::run_download(song, headers, timeout, tx));

        self.status = format!("Downloading: {name}");
    }

    /// Drains the task channel and applies each event to the UI state.
    /// All shared-state mutation happens here, on the interactive thread.
    fn process_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                TaskEvent::Progress(line) => self.append_log(line),
                TaskEvent::DownloadPercent(percent) => self.progress = percent,
                TaskEvent::SearchDone(results) => {
                    self.search_slot.clear();
                    self.table = ResultTable::from_search(&results);
                    self.selected_row = None;

                    if self.table.is_empty() {
                        self.append_log(task::log_line("No results found"));
                        self.info_dialog("Search Result", "No results found");
                    } else {
                        self.append_log(task::log_line(format!(
                            "Displaying {} results",
                            self.table.len()
                        )));
                    }
                    self.status = format!("Search complete: {} results found", self.table.len());
                }
                TaskEvent::SearchFailed(message) => {
                    self.search_slot.clear();
                    self.append_log(format!("✗ Search error: {message}"));
                    self.error_dialog(
                        "Search Error",
                        &format!("An error occurred during search:\n{message}"),
                    );
                    self.status = format!("Search failed: {message}");
                }
                TaskEvent::DownloadDone { name, path } => {
                    self.download_slot.clear();
                    self.progress = 0;
                    self.append_log(format!("✓ Successfully downloaded: {name}"));
                    self.info_dialog(
                        "Download Complete",
                        &format!("Finished downloading {name}\nSaved to: {}", path.display()),
                    );
                    self.status = format!("Download complete: {name}");
                }
                TaskEvent::DownloadFailed(message) => {
                    self.download_slot.clear();
                    self.progress = 0;
                    self.append_log(format!("✗ Download error: {message}"));
                    self.error_dialog("Download Error", &message);
                    self.status = format!("Download failed: {message}");
                }
            }
        }
    }

    fn results_table(&mut self, ui: &mut egui::Ui) {
        let mut clicked_row = None;
        let mut download_row = None;

        TableBuilder::new(ui)
            .striped(true)
            .sense(egui::Sense::click())
            .column(Column::auto().at_least(30.0))
            .column(Column::remainder())
            .column(Column::remainder())
            .column(Column::auto().at_least(60.0))
            .column(Column::auto().at_least(60.0))
            .column(Column::remainder())
            .column(Column::auto().at_least(120.0))
            .header(20.0, |mut header| {
                for title in TABLE_HEADERS {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for (i, song) in self.table.rows().iter().enumerate() {
                    body.row(18.0, |mut row| {
                        row.set_selected(self.selected_row == Some(i));

                        let id = i.to_string();
                        let cells = [
                            id.as_str(),
                            song.singers.as_str(),
                            song.song_name.as_str(),
                            song.file_size.as_str(),
                            song.duration.as_str(),
                            song.album.as_str(),
                            song.source.as_str(),
                        ];
                        for cell in cells {
                            row.col(|ui| {
                                ui.label(cell);
                            });
                        }

                        let response = row.response();
                        if response.clicked() {
                            clicked_row = Some(i);
                        }
                        response.context_menu(|ui| {
                            if ui.button("Download").clicked() {
                                download_row = Some(i);
                                ui.close_menu();
                            }
                        });
                    });
                }
            });

        if let Some(i) = clicked_row {
            self.selected_row = Some(i);
        }
        if let Some(i) = download_row {
            self.selected_row = Some(i);
            self.start_download(i);
        }
    }
}

impl eframe::App for MusicdlApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_events();

        let busy = self.search_slot.is_running() || self.download_slot.is_running();

        // Top panel: source checkboxes, keyword input, progress bar.
        egui::TopBottomPanel::top("search_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Search Engine:");
                for (name, checked) in SOURCE_NAMES.iter().zip(&mut self.source_checked) {
                    ui.checkbox(checked, *name);
                }
            });

            ui.horizontal(|ui| {
                ui.label("Keywords:");
                let response = ui.text_edit_singleline(&mut self.keyword);

                let searching = self.search_slot.is_running();
                let label = if searching { "Searching..." } else { "Search" };
                let clicked = ui
                    .add_enabled(!busy, egui::Button::new(label))
                    .clicked();
                let submitted = response.lost_focus()
                    && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if (clicked || submitted) && !busy {
                    self.start_search();
                }
            });

            ui.horizontal(|ui| {
                ui.label("Download progress:");
                ui.add(
                    egui::ProgressBar::new(f32::from(self.progress) / 100.0).show_percentage(),
                );
            });
        });

        // Bottom panel: status bar above the log feed.
        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::TopBottomPanel::bottom("log_panel")
            .resizable(true)
            .default_height(150.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        for line in &self.log_lines {
                            ui.monospace(line);
                        }
                    });
            });

        // Central panel: results table. Right-click a row to download it.
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.table.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.label("Search for a song to see results");
                });
            } else {
                self.results_table(ui);
            }
        });

        // Keep polling the task channel while background work is running.
        if busy {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SearchResults, SongInfo};

    fn app() -> MusicdlApp {
        MusicdlApp::from_config(Config::default())
    }

    fn app_with_results() -> MusicdlApp {
        let mut app = app();
        let mut results = SearchResults::default();
        results.push(
            "QQMusicClient",
            vec![SongInfo {
                song_name: "尾戒".to_string(),
                source: "QQMusicClient".to_string(),
                ..Default::default()
            }],
        );
        app.table = ResultTable::from_search(&results);
        app.client = Some(Arc::new(
            MusicClient::new(
                &["QQMusicClient".to_string()],
                std::path::Path::new("/tmp"),
            )
            .unwrap(),
        ));
        app
    }

    #[test]
    fn search_guard_rejects_empty_keyword() {
        let mut app = app();
        app.keyword = "   ".to_string();
        assert_eq!(app.search_guard(), Err("Please enter a keyword"));
    }

    #[test]
    fn search_guard_rejects_no_selected_source() {
        let mut app = app();
        app.keyword = "尾戒".to_string();
        app.source_checked = vec![false; SOURCE_NAMES.len()];
        assert_eq!(
            app.search_guard(),
            Err("Please select at least one music source")
        );
    }

    #[test]
    fn search_guard_rejects_duplicate_search() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let mut app = app();
        app.keyword = "尾戒".to_string();
        app.search_slot.spawn(move || {
            let _ = release_rx.recv();
        });

        assert_eq!(app.search_guard(), Err("Search is in progress"));
        release_tx.send(()).unwrap();
    }

    #[test]
    fn search_guard_accepts_and_trims_the_keyword() {
        let mut app = app();
        app.keyword = "  尾戒 ".to_string();

        let (keyword, sources) = app.search_guard().unwrap();
        assert_eq!(keyword, "尾戒");
        // Default config checks every source.
        assert_eq!(sources.len(), SOURCE_NAMES.len());
    }

    #[test]
    fn download_guard_rejects_a_row_missing_from_the_table() {
        let app = app_with_results();
        assert_eq!(app.download_guard(1), Err("Song information not found"));
        assert_eq!(self::app().download_guard(0), Err("Song information not found"));
    }

    #[test]
    fn download_guard_rejects_duplicate_download() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let mut app = app_with_results();
        app.download_slot.spawn(move || {
            let _ = release_rx.recv();
        });

        assert_eq!(app.download_guard(0), Err("Another download is in progress"));
        release_tx.send(()).unwrap();
    }

    #[test]
    fn download_guard_accepts_a_present_record() {
        let app = app_with_results();
        let song = app.download_guard(0).unwrap();
        assert_eq!(song.song_name, "尾戒");
        assert_eq!(song.source, "QQMusicClient");
    }
}
