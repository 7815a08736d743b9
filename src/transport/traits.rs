use async_trait::async_trait;

use super::error::TransportError;
use crate::domain::{RawRecord, ShardCursor, StreamPosition};

/// One page of records plus the cursor for the next read.
///
/// `next` is `None` when the shard is closed and fully drained: the reader
/// treats that as end-of-shard after yielding the final records.
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<RawRecord>,
    pub next: Option<ShardCursor>,
}

/// Stream-service collaborator: shard discovery plus paged shard reads.
///
/// Implementations own retry/backoff for transient throttling; errors that
/// surface here are treated as persistent.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// List the current shard identifiers for a stream.
    async fn list_shards(&self, stream: &str) -> Result<Vec<String>, TransportError>;

    /// Open a read cursor for one shard at the requested position.
    async fn open_cursor(
        &self,
        stream: &str,
        shard: &str,
        position: StreamPosition,
    ) -> Result<ShardCursor, TransportError>;

    /// Read up to `limit` records at the cursor.
    async fn read_page(
        &self,
        stream: &str,
        shard: &str,
        cursor: &ShardCursor,
        limit: usize,
    ) -> Result<RecordPage, TransportError>;
}
