use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use crate::error::DownloadError;
use crate::fsutil;
use crate::models::SongInfo;

/// Fixed read chunk size for the streaming copy.
pub const CHUNK_SIZE: usize = 1024;

/// One progress observation from the copy loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub downloaded: u64,
    /// Declared content length; `None` when the server did not report one.
    pub total: Option<u64>,
    /// Sampled percentage. `None` for byte-count-only observations.
    pub percent: Option<u8>,
}

/// Copies `reader` into `writer` in fixed-size chunks, reporting progress
/// through `emit`.
///
/// Percent is sampled at roughly 1% of `total` and only when `total` is
/// non-zero; a zero/unknown total gets a byte-count observation per chunk
/// instead, which sidesteps the divide-by-zero entirely. Completion forces
/// a final 100, deduplicated so a single download never emits the same
/// percentage twice in a row.
pub fn copy_with_progress<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    total: u64,
    mut emit: F,
) -> std::io::Result<u64>
where
    R: Read,
    W: Write,
    F: FnMut(ProgressEvent),
{
    let threshold = if total > 0 { (total / 100).max(1) } else { 1 };
    let mut buf = [0u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;
    let mut last_sampled: u64 = 0;
    let mut last_percent: Option<u8> = None;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
        downloaded += n as u64;

        if downloaded - last_sampled >= threshold {
            if total > 0 {
                let percent = ((downloaded * 100) / total).min(100) as u8;
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    emit(ProgressEvent {
                        downloaded,
                        total: Some(total),
                        percent: Some(percent),
                    });
                }
            } else {
                emit(ProgressEvent {
                    downloaded,
                    total: None,
                    percent: None,
                });
            }
            last_sampled = downloaded;
        }
    }
    writer.flush()?;

    // Terminal outcome always lands on 100, whatever the sampling remainder.
    if last_percent != Some(100) {
        emit(ProgressEvent {
            downloaded,
            total: (total > 0).then_some(total),
            percent: Some(100),
        });
    }

    Ok(downloaded)
}

/// Performs the streaming HTTP GET for one song and writes it under the
/// song's work directory, overwriting any existing file at that path.
/// Returns the path of the written file.
pub fn download_song<F>(
    song: &SongInfo,
    headers: HeaderMap,
    timeout: Duration,
    emit: F,
) -> Result<PathBuf, DownloadError>
where
    F: FnMut(ProgressEvent),
{
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()?;

    let mut resp = client.get(&song.download_url).headers(headers).send()?;

    if resp.status() != StatusCode::OK {
        return Err(DownloadError::Status(resp.status().as_u16()));
    }

    let total = resp.content_length().unwrap_or(0);

    fsutil::touchdir(&song.work_dir)?;
    let file_name = format!("{}.{}", fsutil::sanitize_filename(&song.song_name), song.ext);
    let path = song.work_dir.join(file_name);

    let mut file = BufWriter::new(File::create(&path)?);
    copy_with_progress(&mut resp, &mut file, total, emit)?;

    Ok(path)
}
