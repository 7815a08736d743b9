use thiserror::Error;

/// Errors from schema resolution and payload decoding.
///
/// `Fetch` and `Parse` happen once at startup and are fatal to the run.
/// The remaining variants are per-record and recovered locally: the raw
/// artifact is still written and processing continues.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("failed to fetch schema {name}: {message}")]
    Fetch { name: String, message: String },

    #[error("invalid schema definition for {name}: {source}")]
    Parse {
        name: String,
        source: apache_avro::Error,
    },

    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to decode payload: {0}")]
    Decode(apache_avro::Error),

    #[error("decoded payload is not a record")]
    NotARecord,
}
