pub mod decoder;
pub mod error;
pub mod registry;
pub mod resolver;

// Re-export commonly used types
pub use decoder::{AvroDecoder, RecordDecoder};
pub use error::SchemaError;
pub use registry::{DEFAULT_REGISTRY_BASE_URL, HttpSchemaRegistry, SchemaDocument, SchemaRegistry};
pub use resolver::SchemaResolver;
