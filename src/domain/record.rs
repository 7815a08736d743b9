use chrono::{DateTime, Utc};
use serde_json::Value;

/// Schema-decoded form of a record payload: field name to value, shape
/// determined by the resolved schema. Insertion order of the first decoded
/// record fixes the CSV column set, so the map preserves key order.
pub type DecodedRecord = serde_json::Map<String, Value>;

/// One event read from a shard. Immutable once read.
///
/// `sequence_number` is unique and monotonically increasing within a shard;
/// no ordering is guaranteed (or required) across shards. `data` is the
/// opaque wire payload, base64 text when the stream carries encoded records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub partition_key: String,
    pub sequence_number: String,
    pub arrival: DateTime<Utc>,
    pub data: Vec<u8>,
}

impl RawRecord {
    pub fn new(
        partition_key: impl Into<String>,
        sequence_number: impl Into<String>,
        arrival: DateTime<Utc>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            partition_key: partition_key.into(),
            sequence_number: sequence_number.into(),
            arrival,
            data: data.into(),
        }
    }
}

/// A page of records read from one shard, tagged with the per-shard batch
/// index for logging and artifact naming.
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub shard: String,
    pub index: u64,
    pub records: Vec<RawRecord>,
}
