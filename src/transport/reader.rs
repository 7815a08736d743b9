use std::sync::Arc;

use tracing::debug;

use super::error::TransportError;
use super::traits::StreamTransport;
use crate::domain::{RecordBatch, ShardCursor, StreamPosition};

enum ReaderState {
    Unopened,
    Open(ShardCursor),
    Closed,
}

/// Sequential reader over one shard.
///
/// Owns the shard's cursor exclusively: the cursor is created on the first
/// read, replaced after every successful page fetch, and discarded when the
/// shard closes. Batches are bounded by `limit` to cap memory and
/// write-burst size per iteration.
pub struct ShardReader<T: StreamTransport> {
    transport: Arc<T>,
    stream: String,
    shard: String,
    position: StreamPosition,
    limit: usize,
    state: ReaderState,
    batches_read: u64,
}

impl<T: StreamTransport> ShardReader<T> {
    pub fn new(
        transport: Arc<T>,
        stream: impl Into<String>,
        shard: impl Into<String>,
        position: StreamPosition,
        limit: usize,
    ) -> Self {
        Self {
            transport,
            stream: stream.into(),
            shard: shard.into(),
            position,
            limit,
            state: ReaderState::Unopened,
            batches_read: 0,
        }
    }

    pub fn shard(&self) -> &str {
        &self.shard
    }

    /// Fetch the next page of records.
    ///
    /// `Ok(Some(batch))` may carry zero records (the stream is live but idle;
    /// poll again). `Ok(None)` is end-of-shard, terminal for this reader.
    pub async fn next_batch(&mut self) -> Result<Option<RecordBatch>, TransportError> {
        let cursor = match std::mem::replace(&mut self.state, ReaderState::Closed) {
            ReaderState::Closed => return Ok(None),
            ReaderState::Open(cursor) => cursor,
            ReaderState::Unopened => {
                let cursor = self
                    .transport
                    .open_cursor(&self.stream, &self.shard, self.position)
                    .await?;
                debug!(shard = %self.shard, "opened shard cursor");
                cursor
            }
        };

        let page = self
            .transport
            .read_page(&self.stream, &self.shard, &cursor, self.limit)
            .await?;

        if let Some(next) = page.next {
            self.state = ReaderState::Open(next);
        }

        let batch = RecordBatch {
            shard: self.shard.clone(),
            index: self.batches_read,
            records: page.records,
        };
        self.batches_read += 1;
        Ok(Some(batch))
    }
}
