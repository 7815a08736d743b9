pub mod position;
pub mod record;
pub mod summary;

// Re-export commonly used types
pub use position::{ShardCursor, StreamPosition};
pub use record::{DecodedRecord, RawRecord, RecordBatch};
pub use summary::{decoded_summary, raw_summary, RAW_SUMMARY_LEN, SUMMARY_FIELDS};
