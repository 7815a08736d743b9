use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde_json::Value;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::error::SinkError;
use crate::domain::{DecodedRecord, RawRecord};

/// Idempotently create a destination directory.
pub async fn ensure_dir(path: &Path) -> Result<(), SinkError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| SinkError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}

/// Core idempotency primitive: create-new then write, never overwrite.
///
/// Returns `false` (a no-op) when the artifact already exists, which is what
/// makes restart-and-replay safe against duplicate artifacts.
pub async fn write_if_absent(path: &Path, content: &[u8]) -> Result<bool, SinkError> {
    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(SinkError::write(path, e)),
    };

    file.write_all(content)
        .await
        .map_err(|e| SinkError::write(path, e))?;
    file.flush().await.map_err(|e| SinkError::write(path, e))?;
    Ok(true)
}

/// Per-record envelope written to disk, matching the shape of a stream
/// event: `Data` is the base64 payload for the raw artifact and the decoded
/// object for the `.decoded` artifact.
#[derive(Serialize)]
struct Artifact<'a> {
    #[serde(rename = "PartitionKey")]
    partition_key: &'a str,
    #[serde(rename = "SequenceNumber")]
    sequence_number: &'a str,
    #[serde(rename = "ApproximateArrivalTimestamp")]
    arrival: String,
    #[serde(rename = "Data")]
    data: Value,
}

/// Writes each record to a uniquely named file under
/// `<outdir>/<stream>/<partitionKey>-<sequenceNumber>-<indexInBatch>[.decoded].json`.
///
/// Artifact identity is stable across restarts; existing files are skipped,
/// never overwritten.
#[derive(Clone)]
pub struct RecordSink {
    base_dir: PathBuf,
}

impl RecordSink {
    pub fn new(outdir: impl AsRef<Path>, stream: &str) -> Self {
        Self {
            base_dir: outdir.as_ref().join(stream),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create the destination directory if missing.
    pub async fn ensure_dir(&self) -> Result<(), SinkError> {
        ensure_dir(&self.base_dir).await
    }

    pub fn artifact_path(&self, record: &RawRecord, index: usize, decoded: bool) -> PathBuf {
        let suffix = if decoded { ".decoded" } else { "" };
        self.base_dir.join(format!(
            "{}-{}-{}{}.json",
            record.partition_key, record.sequence_number, index, suffix
        ))
    }

    /// Persist the raw artifact and, when decoding succeeded, the decoded
    /// artifact alongside it. A decode failure never suppresses the raw
    /// write.
    pub async fn persist(
        &self,
        record: &RawRecord,
        index: usize,
        decoded: Option<&DecodedRecord>,
    ) -> Result<(), SinkError> {
        let raw_path = self.artifact_path(record, index, false);
        let raw_body = self.render(record, Value::String(BASE64.encode(&record.data)))?;
        let written = write_if_absent(&raw_path, raw_body.as_bytes()).await?;
        debug!(path = %raw_path.display(), written, "raw artifact");

        if let Some(fields) = decoded {
            let decoded_path = self.artifact_path(record, index, true);
            let decoded_body = self.render(record, Value::Object(fields.clone()))?;
            let written = write_if_absent(&decoded_path, decoded_body.as_bytes()).await?;
            debug!(path = %decoded_path.display(), written, "decoded artifact");
        }

        Ok(())
    }

    fn render(&self, record: &RawRecord, data: Value) -> Result<String, SinkError> {
        let artifact = Artifact {
            partition_key: &record.partition_key,
            sequence_number: &record.sequence_number,
            arrival: record.arrival.to_rfc3339(),
            data,
        };
        Ok(serde_json::to_string_pretty(&artifact)?)
    }
}
