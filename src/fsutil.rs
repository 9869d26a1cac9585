use std::io;
use std::path::Path;

/// Creates the directory (and any missing parents) if it does not exist.
pub fn touchdir(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// Maps a logical song name to a safe on-disk filename.
///
/// Path separators and characters rejected on common filesystems are
/// replaced with underscores; leading/trailing whitespace and dots are
/// stripped so the name can't escape the target directory or collide with
/// special entries.
pub fn sanitize_filename(name: &str) -> String {
    const FORBIDDEN: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

    let cleaned: String = name
        .chars()
        .map(|c| {
            if FORBIDDEN.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = cleaned.trim().trim_matches('.').trim();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}
