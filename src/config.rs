use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::sources;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory downloaded files are written into.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Connect/read timeout for download requests, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sources checked by default in the search form.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            timeout_secs: default_timeout_secs(),
            sources: default_sources(),
        }
    }
}

fn default_work_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join("Music").join("musicdl")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_sources() -> Vec<String> {
    sources::SOURCE_NAMES.iter().map(|s| s.to_string()).collect()
}

fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("musicdl-gui")
        .join("config.toml")
}

pub fn load_config() -> Config {
    let path = config_path();
    if !path.exists() {
        return Config::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(content) => toml::from_str(&content).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: Config = toml::from_str("timeout_secs = 10").unwrap();
        assert_eq!(cfg.timeout_secs, 10);
        assert_eq!(cfg.sources, default_sources());
        assert_eq!(cfg.work_dir, default_work_dir());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let cfg = Config {
            work_dir: PathBuf::from("/tmp/music"),
            timeout_secs: 15,
            sources: vec!["QQMusicClient".to_string()],
        };
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.work_dir, cfg.work_dir);
        assert_eq!(parsed.timeout_secs, 15);
        assert_eq!(parsed.sources, cfg.sources);
    }
}
