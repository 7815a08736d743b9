use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::{DecodedRecord, RawRecord, RecordBatch, decoded_summary, raw_summary};
use crate::io::{RecordSink, SinkError};
use crate::schema::RecordDecoder;
use crate::streaming::AggregatorHandle;

/// How a batch finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// All records handled; the pipeline should read the next batch.
    Completed,
    /// The stop boundary was crossed (or the global stop was observed);
    /// the pipeline must not read again.
    Stopped,
}

/// Per-shard record handler: decode-or-pass-through, display summary,
/// stop-boundary check, then routing to the persistence sink and the
/// aggregator.
///
/// Decode failures are non-fatal per record: the raw artifact is still
/// written, the summary degrades to the raw form, and processing continues.
pub struct RecordProcessor {
    schema_name: String,
    decoder: Option<Arc<dyn RecordDecoder>>,
    pluck: Vec<String>,
    stop_at: Option<DateTime<Utc>>,
    sink: RecordSink,
    aggregator: AggregatorHandle,
    cancel: CancellationToken,
}

impl RecordProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schema_name: String,
        decoder: Option<Arc<dyn RecordDecoder>>,
        pluck: Vec<String>,
        stop_at: Option<DateTime<Utc>>,
        sink: RecordSink,
        aggregator: AggregatorHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            schema_name,
            decoder,
            pluck,
            stop_at,
            sink,
            aggregator,
            cancel,
        }
    }

    /// Handle one batch in arrival order. The global stop is observed at
    /// least once per record; the stop boundary is checked per record,
    /// first crossing wins.
    pub async fn process_batch(&self, batch: &RecordBatch) -> Result<BatchOutcome, SinkError> {
        for (index, record) in batch.records.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Ok(BatchOutcome::Stopped);
            }

            let decoded = self.decode(record, &batch.shard);
            let summary = match &decoded {
                Some(fields) => decoded_summary(fields, &self.pluck),
                None => raw_summary(&record.data),
            };

            if let Some(stop) = self.stop_at
                && record.arrival >= stop
            {
                info!(
                    shard = %batch.shard,
                    sequence = %record.sequence_number,
                    arrival = %record.arrival,
                    boundary = %stop,
                    "stop boundary crossed, ending run"
                );
                self.aggregator.flush_csv().await;
                self.cancel.cancel();
                return Ok(BatchOutcome::Stopped);
            }

            if self.aggregator.csv_enabled() {
                self.aggregator.csv_row(decoded.clone()).await;
            }

            self.sink.persist(record, index, decoded.as_ref()).await?;

            if self.aggregator.envelope_enabled() {
                self.aggregator.envelope(&batch.shard, record.clone()).await;
            }

            info!(
                arrival = %record.arrival,
                schema = %self.schema_name,
                shard = %batch.shard,
                batch = batch.index,
                "{summary}"
            );
        }

        self.aggregator.batch_end().await;
        Ok(BatchOutcome::Completed)
    }

    fn decode(&self, record: &RawRecord, shard: &str) -> Option<DecodedRecord> {
        let decoder = self.decoder.as_ref()?;
        match decoder.decode(&record.data) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(
                    shard = %shard,
                    sequence = %record.sequence_number,
                    error = %e,
                    "failed to decode record, persisting raw form only"
                );
                None
            }
        }
    }
}
