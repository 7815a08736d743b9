pub mod error;
pub mod kinesis;
pub mod reader;
pub mod traits;

// Re-export commonly used types
pub use error::TransportError;
pub use kinesis::KinesisTransport;
pub use reader::ShardReader;
pub use traits::{RecordPage, StreamTransport};
