use std::sync::Arc;

use tracing::info;

use super::decoder::{AvroDecoder, RecordDecoder};
use super::error::SchemaError;
use super::registry::SchemaRegistry;

/// Turns a logical schema name into a ready-to-use decoder.
///
/// The registry is consulted exactly once per run; a fetch or parse failure
/// aborts the run before any shard pipeline starts.
pub struct SchemaResolver<R: SchemaRegistry> {
    registry: R,
}

impl<R: SchemaRegistry> SchemaResolver<R> {
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    pub async fn resolve(&self, name: &str) -> Result<Arc<dyn RecordDecoder>, SchemaError> {
        let document = self.registry.fetch(name).await?;
        let decoder = AvroDecoder::from_definition(name, &document.definition)?;
        info!(schema = name, "resolved schema");
        Ok(Arc::new(decoder))
    }
}
