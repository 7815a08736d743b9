pub mod processor;

// Re-export commonly used types
pub use processor::{BatchOutcome, RecordProcessor};
