use thiserror::Error;

/// Errors from the stream-service transport.
///
/// `StreamNotFound` is fatal at startup. The per-shard variants are fatal
/// to that shard's pipeline only; sibling pipelines keep running. Transient
/// throttling is retried inside the SDK transport and never reaches here.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("stream not found: {0}")]
    StreamNotFound(String),

    #[error("failed to list shards for {stream}: {message}")]
    ListShards { stream: String, message: String },

    #[error("failed to open cursor for shard {shard}: {message}")]
    OpenCursor { shard: String, message: String },

    #[error("read failed on shard {shard}: {message}")]
    Read { shard: String, message: String },
}
