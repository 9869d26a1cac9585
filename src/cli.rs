use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, Table};
use dialoguer::{Input, Select};

use crate::config::{self, Config};
use crate::download;
use crate::results::ResultTable;
use crate::sources::{MusicClient, SOURCE_NAMES};

#[derive(Parser)]
#[command(name = "musicdl-gui", about = "Search and download music from multiple sources")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search from the terminal and pick a song to download
    Search {
        keyword: String,
        /// Sources to query (default: the configured ones)
        #[arg(long)]
        source: Vec<String>,
        /// Directory to download into (default: the configured work dir)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Edit the saved configuration
    Config,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Search {
            keyword,
            source,
            dir,
        }) => cmd_search(&keyword, source, dir),
        Some(Commands::Config) => cmd_config(),
        None => {
            #[cfg(feature = "gui")]
            {
                crate::gui::launch(config::load_config());
                Ok(())
            }
            #[cfg(not(feature = "gui"))]
            {
                println!("Usage: musicdl-gui <command>");
                println!("Run musicdl-gui --help for details, or rebuild with --features gui.");
                Ok(())
            }
        }
    }
}

fn cmd_search(keyword: &str, sources: Vec<String>, dir: Option<PathBuf>) -> Result<()> {
    let cfg = config::load_config();
    let sources = if sources.is_empty() {
        cfg.sources.clone()
    } else {
        sources
    };
    let work_dir = dir.unwrap_or_else(|| cfg.work_dir.clone());

    let client = MusicClient::new(&sources, &work_dir)
        .context("Failed to initialize music client")?;

    println!("Searching for: {keyword}");
    let results = client.search(keyword, |line| println!("  {line}"))?;

    if results.is_empty() {
        println!("No results found");
        return Ok(());
    }

    let table = ResultTable::from_search(&results);

    let mut out = Table::new();
    out.set_header(vec![
        "ID", "Singers", "Songname", "Filesize", "Duration", "Album", "Source",
    ]);
    for (i, song) in table.rows().iter().enumerate() {
        out.add_row(vec![
            Cell::new(i),
            Cell::new(&song.singers),
            Cell::new(&song.song_name),
            Cell::new(&song.file_size),
            Cell::new(&song.duration),
            Cell::new(&song.album),
            Cell::new(&song.source),
        ]);
    }
    println!("{out}");

    let mut items: Vec<String> = table.rows().iter().map(|s| s.summary()).collect();
    items.push("Quit without downloading".to_string());

    let selection = Select::new()
        .with_prompt("Pick a song to download")
        .items(&items)
        .default(0)
        .interact()?;

    if selection >= table.len() {
        return Ok(());
    }

    let song = table
        .get(&selection.to_string())
        .context("Song information not found")?
        .clone();
    let headers = client.download_headers(&song.source);
    let timeout = Duration::from_secs(cfg.timeout_secs);

    println!("Starting download: {}", song.song_name);
    let path = download::download_song(&song, headers, timeout, |ev| {
        println!("{}", progress_line(ev));
    })?;

    println!("Download completed: {}", path.display());
    Ok(())
}

/// One printed line per progress observation. Every event produces output,
/// including the forced terminal 100 of a download with no content length.
fn progress_line(ev: download::ProgressEvent) -> String {
    match (ev.percent, ev.total) {
        (Some(percent), Some(total)) => format!(
            "Downloading... {}% ({}/{} bytes)",
            percent, ev.downloaded, total
        ),
        (Some(percent), None) => format!("Downloading... {percent}%"),
        (None, _) => format!("Downloading... {} bytes", ev.downloaded),
    }
}

fn cmd_config() -> Result<()> {
    let mut cfg = config::load_config();

    println!("musicdl-gui configuration");

    let work_dir: String = Input::new()
        .with_prompt("Download directory")
        .with_initial_text(cfg.work_dir.display().to_string())
        .interact_text()?;

    let timeout: u64 = Input::new()
        .with_prompt("Download timeout (seconds)")
        .with_initial_text(cfg.timeout_secs.to_string())
        .interact_text()?;

    println!("Available sources: {}", SOURCE_NAMES.join(", "));
    let sources: String = Input::new()
        .with_prompt("Default sources (comma separated)")
        .with_initial_text(cfg.sources.join(","))
        .interact_text()?;

    cfg = Config {
        work_dir: PathBuf::from(work_dir),
        timeout_secs: timeout,
        sources: sources
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    };

    config::save_config(&cfg)?;
    println!("Configuration saved!");
    Ok(())
}
