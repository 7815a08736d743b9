use apache_avro::types::Value as AvroValue;
use apache_avro::{Schema, from_avro_datum};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Number, Value};

use super::error::SchemaError;
use crate::domain::DecodedRecord;

/// Decode one wire payload into a structured record.
///
/// The payload arrives as base64 text; implementations decode it to raw
/// bytes and then apply the schema.
pub trait RecordDecoder: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<DecodedRecord, SchemaError>;
}

/// Avro datum decoder built from a registry schema definition.
#[derive(Debug)]
pub struct AvroDecoder {
    schema: Schema,
}

impl AvroDecoder {
    /// Parse a schema definition (the escaped JSON string from the registry
    /// document) into a decoder.
    pub fn from_definition(name: &str, definition: &str) -> Result<Self, SchemaError> {
        let schema = Schema::parse_str(definition).map_err(|source| SchemaError::Parse {
            name: name.to_string(),
            source,
        })?;
        Ok(Self { schema })
    }
}

impl RecordDecoder for AvroDecoder {
    fn decode(&self, payload: &[u8]) -> Result<DecodedRecord, SchemaError> {
        let raw = BASE64.decode(payload)?;
        let mut cursor = raw.as_slice();
        let value =
            from_avro_datum(&self.schema, &mut cursor, None).map_err(SchemaError::Decode)?;
        match avro_to_json(value) {
            Value::Object(map) => Ok(map),
            _ => Err(SchemaError::NotARecord),
        }
    }
}

/// Lower an Avro value tree into plain JSON. Bytes become base64 strings;
/// unions collapse to their inner value.
fn avro_to_json(value: AvroValue) -> Value {
    match value {
        AvroValue::Null => Value::Null,
        AvroValue::Boolean(b) => Value::Bool(b),
        AvroValue::Int(i) => Value::Number(i.into()),
        AvroValue::Long(i) => Value::Number(i.into()),
        AvroValue::Float(f) => Number::from_f64(f64::from(f))
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AvroValue::Double(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        AvroValue::Bytes(bytes) | AvroValue::Fixed(_, bytes) => {
            Value::String(BASE64.encode(bytes))
        }
        AvroValue::String(s) => Value::String(s),
        AvroValue::Enum(_, symbol) => Value::String(symbol),
        AvroValue::Union(_, inner) => avro_to_json(*inner),
        AvroValue::Array(items) => Value::Array(items.into_iter().map(avro_to_json).collect()),
        AvroValue::Map(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k, avro_to_json(v)))
                .collect(),
        ),
        AvroValue::Record(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (k, avro_to_json(v)))
                .collect(),
        ),
        AvroValue::Date(d) => Value::Number(d.into()),
        AvroValue::TimeMillis(t) => Value::Number(t.into()),
        AvroValue::TimeMicros(t) => Value::Number(t.into()),
        AvroValue::TimestampMillis(t) => Value::Number(t.into()),
        AvroValue::TimestampMicros(t) => Value::Number(t.into()),
        other => Value::String(format!("{other:?}")),
    }
}
