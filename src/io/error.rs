use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Filesystem and serialization errors from the persistence sink.
///
/// Write failures carry the path so console output can be correlated with
/// on-disk artifacts. A `Write` error is fatal to the pipeline attempting
/// the write.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SinkError {
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SinkError::Write {
            path: path.into(),
            source,
        }
    }
}
