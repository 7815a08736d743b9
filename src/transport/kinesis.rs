use async_trait::async_trait;
use aws_sdk_kinesis::Client;
use aws_sdk_kinesis::primitives::DateTime as AwsDateTime;
use aws_sdk_kinesis::types::ShardIteratorType;
use chrono::{DateTime, TimeZone, Utc};

use super::error::TransportError;
use super::traits::{RecordPage, StreamTransport};
use crate::domain::{RawRecord, ShardCursor, StreamPosition};

/// Kinesis-backed transport. Shard iterators are the cursor tokens; a
/// missing `NextShardIterator` means the shard is closed.
pub struct KinesisTransport {
    client: Client,
}

impl KinesisTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StreamTransport for KinesisTransport {
    async fn list_shards(&self, stream: &str) -> Result<Vec<String>, TransportError> {
        let response = self
            .client
            .list_shards()
            .stream_name(stream)
            .send()
            .await
            .map_err(|err| {
                let service = err.into_service_error();
                if service.is_resource_not_found_exception() {
                    TransportError::StreamNotFound(stream.to_string())
                } else {
                    TransportError::ListShards {
                        stream: stream.to_string(),
                        message: service.to_string(),
                    }
                }
            })?;

        Ok(response
            .shards()
            .iter()
            .map(|shard| shard.shard_id().to_string())
            .collect())
    }

    async fn open_cursor(
        &self,
        stream: &str,
        shard: &str,
        position: StreamPosition,
    ) -> Result<ShardCursor, TransportError> {
        let mut request = self
            .client
            .get_shard_iterator()
            .stream_name(stream)
            .shard_id(shard);

        request = match position {
            StreamPosition::TrimHorizon => {
                request.shard_iterator_type(ShardIteratorType::TrimHorizon)
            }
            StreamPosition::Latest => request.shard_iterator_type(ShardIteratorType::Latest),
            StreamPosition::AtTimestamp(t) => request
                .shard_iterator_type(ShardIteratorType::AtTimestamp)
                .timestamp(AwsDateTime::from_millis(t.timestamp_millis())),
        };

        let response = request.send().await.map_err(|err| {
            let service = err.into_service_error();
            if service.is_resource_not_found_exception() {
                TransportError::StreamNotFound(stream.to_string())
            } else {
                TransportError::OpenCursor {
                    shard: shard.to_string(),
                    message: service.to_string(),
                }
            }
        })?;

        response
            .shard_iterator()
            .map(ShardCursor::new)
            .ok_or_else(|| TransportError::OpenCursor {
                shard: shard.to_string(),
                message: "no shard iterator returned".to_string(),
            })
    }

    async fn read_page(
        &self,
        _stream: &str,
        shard: &str,
        cursor: &ShardCursor,
        limit: usize,
    ) -> Result<RecordPage, TransportError> {
        let response = self
            .client
            .get_records()
            .shard_iterator(cursor.token())
            .limit(limit as i32)
            .send()
            .await
            .map_err(|err| TransportError::Read {
                shard: shard.to_string(),
                message: err.into_service_error().to_string(),
            })?;

        let records = response
            .records()
            .iter()
            .map(|record| {
                RawRecord::new(
                    record.partition_key(),
                    record.sequence_number(),
                    arrival_time(record.approximate_arrival_timestamp()),
                    record.data().as_ref().to_vec(),
                )
            })
            .collect();

        Ok(RecordPage {
            records,
            next: response.next_shard_iterator().map(ShardCursor::new),
        })
    }
}

fn arrival_time(timestamp: Option<&AwsDateTime>) -> DateTime<Utc> {
    timestamp
        .and_then(|t| t.to_millis().ok())
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .unwrap_or_else(Utc::now)
}
