use thiserror::Error;

/// Failure taxonomy for a download task. Every variant is converted to a
/// human-readable message at the task boundary and delivered as the task's
/// terminal failure outcome, never propagated as an uncaught fault.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The server answered with a non-200 status.
    #[error("Server returned status code: {0}")]
    Status(u16),

    /// Connection, timeout or other transport-level failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Anything else that went wrong while writing the file.
    #[error("Download error: {0}")]
    Io(#[from] std::io::Error),
}
