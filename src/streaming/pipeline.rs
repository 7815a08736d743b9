use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::engine::{BatchOutcome, RecordProcessor};
use crate::transport::{ShardReader, StreamTransport};

/// Pause between reads on a live-but-idle shard. Page reads are
/// rate-limited per shard by the stream service, so an empty page must not
/// loop straight back into the next read.
const IDLE_POLL_DELAY: Duration = Duration::from_millis(250);

/// Terminal state of one shard's pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEnd {
    /// The shard is closed and fully drained. Sibling shards continue.
    EndOfShard,
    /// The global stop was observed (boundary crossing, session deadline,
    /// or signal).
    Stopped,
    /// A persistent read or write failure. Fatal to this shard only.
    Fatal,
}

/// One shard's read/process loop: `Reading -> Processing -> Reading` until
/// end-of-shard, global stop, or a fatal error. A batch is fully processed
/// before the next read; empty batches pause for `IDLE_POLL_DELAY` and
/// then read again.
pub struct ShardPipeline<T: StreamTransport> {
    reader: ShardReader<T>,
    processor: RecordProcessor,
    cancel: CancellationToken,
}

impl<T: StreamTransport> ShardPipeline<T> {
    pub fn new(
        reader: ShardReader<T>,
        processor: RecordProcessor,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            reader,
            processor,
            cancel,
        }
    }

    pub async fn run(mut self) -> PipelineEnd {
        loop {
            let batch = tokio::select! {
                _ = self.cancel.cancelled() => return PipelineEnd::Stopped,
                result = self.reader.next_batch() => match result {
                    Ok(Some(batch)) => batch,
                    Ok(None) => {
                        info!(shard = %self.reader.shard(), "end of shard");
                        return PipelineEnd::EndOfShard;
                    }
                    Err(e) => {
                        error!(shard = %self.reader.shard(), error = %e, "shard read failed");
                        return PipelineEnd::Fatal;
                    }
                },
            };

            // Global stop is re-checked at every batch boundary.
            if self.cancel.is_cancelled() {
                return PipelineEnd::Stopped;
            }

            if batch.records.is_empty() {
                tokio::select! {
                    _ = self.cancel.cancelled() => return PipelineEnd::Stopped,
                    _ = tokio::time::sleep(IDLE_POLL_DELAY) => {}
                }
                continue;
            }

            match self.processor.process_batch(&batch).await {
                Ok(BatchOutcome::Completed) => {}
                Ok(BatchOutcome::Stopped) => return PipelineEnd::Stopped,
                Err(e) => {
                    error!(shard = %batch.shard, error = %e, "persistence failed");
                    return PipelineEnd::Fatal;
                }
            }
        }
    }
}
