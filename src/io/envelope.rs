use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;

use super::error::SinkError;
use crate::domain::RawRecord;

#[derive(Serialize)]
struct EnvelopeDocument<'a> {
    #[serde(rename = "Records")]
    records: Vec<EnvelopeEntry<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeEntry<'a> {
    kinesis: KinesisPayload<'a>,
    event_source: &'static str,
    event_version: &'static str,
    #[serde(rename = "eventID")]
    event_id: String,
    event_name: &'static str,
    aws_region: &'a str,
    #[serde(rename = "eventSourceARN")]
    event_source_arn: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KinesisPayload<'a> {
    kinesis_schema_version: &'static str,
    partition_key: &'a str,
    sequence_number: &'a str,
    data: String,
    approximate_arrival_timestamp: f64,
}

/// Append-only accumulation of every record seen across the run (all
/// shards), rendered as an event-source notification document. Rebuilt in
/// full on every serialization, not incrementally patched.
pub struct EnvelopeAccumulator {
    stream_arn: String,
    region: String,
    entries: Vec<(String, RawRecord)>,
}

impl EnvelopeAccumulator {
    pub fn new(stream: &str, region: &str) -> Self {
        Self {
            stream_arn: format!("arn:aws:kinesis:{region}::stream/{stream}"),
            region: region.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, shard: String, record: RawRecord) {
        self.entries.push((shard, record));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the full accumulation as a notification document.
    pub fn render(&self) -> Result<String, SinkError> {
        let records = self
            .entries
            .iter()
            .map(|(shard, record)| EnvelopeEntry {
                kinesis: KinesisPayload {
                    kinesis_schema_version: "1.0",
                    partition_key: &record.partition_key,
                    sequence_number: &record.sequence_number,
                    data: BASE64.encode(&record.data),
                    approximate_arrival_timestamp: record.arrival.timestamp_millis() as f64
                        / 1000.0,
                },
                event_source: "aws:kinesis",
                event_version: "1.0",
                event_id: format!("{shard}:{}", record.sequence_number),
                event_name: "aws:kinesis:record",
                aws_region: &self.region,
                event_source_arn: &self.stream_arn,
            })
            .collect();

        Ok(serde_json::to_string_pretty(&EnvelopeDocument { records })?)
    }
}
