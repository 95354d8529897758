use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions that abort a run before any file is touched.
///
/// Per-file problems (vanished source, write error, permission denied) are
/// not errors at this level; they are recorded as outcomes in the run
/// report and the run continues.
#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("Source directory not found or not a directory: {0}")]
    SourceNotFound(PathBuf),

    #[error("Failed to create destination directory {path}: {source}")]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Insufficient space: {required} bytes required, {available} bytes available")]
    InsufficientSpace { required: u64, available: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OrganizeError>;
