use std::io;

use thiserror::Error;

use crate::io::SinkError;
use crate::schema::SchemaError;
use crate::transport::TransportError;

/// Top-level application errors unifying all layer errors.
///
/// Everything here is fatal at startup: bad configuration, a failed schema
/// fetch, or a missing stream all exit the process before any shard work
/// begins. Per-record and per-shard failures never reach this type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid timestamp {0:?} (expected RFC 3339 or YYYY-MM-DD[ HH:MM:SS])")]
    InvalidTimestamp(String),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
