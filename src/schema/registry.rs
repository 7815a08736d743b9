use async_trait::async_trait;
use serde::Deserialize;

use super::error::SchemaError;

/// Schema document as returned by the registry: the Avro schema itself is
/// carried as an escaped JSON string in the `schema` property.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDocument {
    #[serde(rename = "schema")]
    pub definition: String,
}

/// Registry collaborator: fetch a named schema document.
///
/// Fetched exactly once per run, never per shard or per record.
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    async fn fetch(&self, name: &str) -> Result<SchemaDocument, SchemaError>;
}

#[derive(Debug, Deserialize)]
struct RegistryResponse {
    data: SchemaDocument,
}

/// HTTP registry client against the platform API's `current-schemas`
/// endpoint.
pub struct HttpSchemaRegistry {
    base_url: String,
    client: reqwest::Client,
}

pub const DEFAULT_REGISTRY_BASE_URL: &str = "http://platform.nypl.org/api/v0.1/";

impl HttpSchemaRegistry {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpSchemaRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_BASE_URL)
    }
}

#[async_trait]
impl SchemaRegistry for HttpSchemaRegistry {
    async fn fetch(&self, name: &str) -> Result<SchemaDocument, SchemaError> {
        let url = format!("{}current-schemas/{}", self.base_url, name);
        let fetch_err = |message: String| SchemaError::Fetch {
            name: name.to_string(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?
            .error_for_status()
            .map_err(|e| fetch_err(e.to_string()))?;

        let body: RegistryResponse = response
            .json()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        Ok(body.data)
    }
}
