//! Prelude module for convenient imports
//!
//! Import everything you need with: `use streamtap::prelude::*;`

// Domain types
pub use crate::domain::{
    DecodedRecord, RawRecord, RecordBatch, ShardCursor, StreamPosition, decoded_summary,
    raw_summary,
};

// Schema types
pub use crate::schema::{
    AvroDecoder, HttpSchemaRegistry, RecordDecoder, SchemaDocument, SchemaError, SchemaRegistry,
    SchemaResolver,
};

// Transport types
pub use crate::transport::{
    KinesisTransport, RecordPage, ShardReader, StreamTransport, TransportError,
};

// Engine types
pub use crate::engine::{BatchOutcome, RecordProcessor};

// IO types
pub use crate::io::{
    CsvAccumulator, EnvelopeAccumulator, RecordSink, SinkError, ensure_dir, write_if_absent,
};

// Streaming types
pub use crate::streaming::{
    AggregatorHandle, PipelineEnd, RunSummary, ShardPipeline, StreamOrchestrator,
};

// App types
pub use crate::app::{AppError, CliApp, ListenArgs, ListenerConfig};
