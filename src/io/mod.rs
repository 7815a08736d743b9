pub mod csv_export;
pub mod envelope;
pub mod error;
pub mod sink;

// Re-export commonly used types
pub use csv_export::CsvAccumulator;
pub use envelope::EnvelopeAccumulator;
pub use error::SinkError;
pub use sink::{RecordSink, ensure_dir, write_if_absent};
