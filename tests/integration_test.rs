use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use apache_avro::types::Value as AvroValue;
use apache_avro::{Schema, to_avro_datum};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use streamtap::prelude::*;

const BIB_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Bib",
    "fields": [
        {"name": "id", "type": "string"},
        {"name": "nyplSource", "type": "string"}
    ]
}"#;

/// In-memory stream service: fixed shards, paged reads, optional read
/// delay after the first page to make cross-shard races deterministic.
struct MemoryTransport {
    shards: Vec<(String, Vec<RawRecord>)>,
    page_size: usize,
    delay_after_first_read: Option<Duration>,
    endless: bool,
    reads: AtomicUsize,
}

impl MemoryTransport {
    fn new(shards: Vec<(String, Vec<RawRecord>)>) -> Self {
        Self {
            shards,
            page_size: 100,
            delay_after_first_read: None,
            endless: false,
            reads: AtomicUsize::new(0),
        }
    }

    /// Keep the shards open forever: drained shards serve empty pages with
    /// a fresh cursor instead of closing.
    fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    fn with_delay_after_first_read(mut self, delay: Duration) -> Self {
        self.delay_after_first_read = Some(delay);
        self
    }

    fn records_for(&self, shard: &str) -> &[RawRecord] {
        self.shards
            .iter()
            .find(|(id, _)| id == shard)
            .map(|(_, records)| records.as_slice())
            .expect("unknown shard")
    }
}

#[async_trait]
impl StreamTransport for MemoryTransport {
    async fn list_shards(&self, stream: &str) -> Result<Vec<String>, TransportError> {
        if stream == "missing-stream" {
            return Err(TransportError::StreamNotFound(stream.to_string()));
        }
        Ok(self.shards.iter().map(|(id, _)| id.clone()).collect())
    }

    async fn open_cursor(
        &self,
        _stream: &str,
        shard: &str,
        _position: StreamPosition,
    ) -> Result<ShardCursor, TransportError> {
        Ok(ShardCursor::new(format!("{shard}:0")))
    }

    async fn read_page(
        &self,
        _stream: &str,
        shard: &str,
        cursor: &ShardCursor,
        limit: usize,
    ) -> Result<RecordPage, TransportError> {
        if self.reads.fetch_add(1, Ordering::SeqCst) >= self.shards.len()
            && let Some(delay) = self.delay_after_first_read
        {
            tokio::time::sleep(delay).await;
        }

        let offset: usize = cursor
            .token()
            .rsplit(':')
            .next()
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        let records = self.records_for(shard);
        let take = limit.min(self.page_size);
        let page: Vec<RawRecord> = records.iter().skip(offset).take(take).cloned().collect();
        let next_offset = offset + page.len();

        Ok(RecordPage {
            records: page,
            next: (next_offset < records.len() || self.endless)
                .then(|| ShardCursor::new(format!("{shard}:{next_offset}"))),
        })
    }
}

struct FakeRegistry {
    definition: String,
}

impl FakeRegistry {
    fn bib() -> Self {
        Self {
            definition: BIB_SCHEMA.to_string(),
        }
    }
}

#[async_trait]
impl SchemaRegistry for FakeRegistry {
    async fn fetch(&self, _name: &str) -> Result<SchemaDocument, SchemaError> {
        Ok(SchemaDocument {
            definition: self.definition.clone(),
        })
    }
}

fn config(outdir: PathBuf, stream: &str) -> ListenerConfig {
    ListenerConfig {
        stream: stream.to_string(),
        schema_name: stream.to_string(),
        decode: false,
        pluck: vec![],
        position: StreamPosition::TrimHorizon,
        stop_at: None,
        csv_path: None,
        envelope_path: None,
        profile: "nypl-sandbox".to_string(),
        region: "us-east-1".to_string(),
        outdir,
        page_limit: 100,
        session_duration: Duration::from_secs(60),
        csv_flush_every: 50,
    }
}

fn record(pk: &str, seq: &str, arrival: DateTime<Utc>, data: &[u8]) -> RawRecord {
    RawRecord::new(pk, seq, arrival, data.to_vec())
}

fn bib_payload(id: &str, source: &str) -> Vec<u8> {
    let schema = Schema::parse_str(BIB_SCHEMA).unwrap();
    let datum = AvroValue::Record(vec![
        ("id".to_string(), AvroValue::String(id.to_string())),
        ("nyplSource".to_string(), AvroValue::String(source.to_string())),
    ]);
    BASE64
        .encode(to_avro_datum(&schema, datum).unwrap())
        .into_bytes()
}

async fn run_with(
    transport: MemoryTransport,
    registry: FakeRegistry,
    config: ListenerConfig,
) -> Result<RunSummary, AppError> {
    StreamOrchestrator::new(Arc::new(transport), config)
        .run(registry, CancellationToken::new())
        .await
}

async fn run(
    transport: MemoryTransport,
    config: ListenerConfig,
) -> Result<RunSummary, AppError> {
    run_with(transport, FakeRegistry::bib(), config).await
}

#[tokio::test]
async fn two_shard_stream_persists_raw_envelopes() {
    let dir = tempfile::tempdir().unwrap();
    let data = BASE64.encode(b"some avro-encoded bytes").into_bytes();
    let transport = MemoryTransport::new(vec![
        (
            "shardId-000000000001".to_string(),
            vec![record("p1", "100", Utc::now(), &data)],
        ),
        ("shardId-000000000002".to_string(), vec![]),
    ]);

    let summary = run(transport, config(dir.path().to_path_buf(), "Foo"))
        .await
        .unwrap();

    assert_eq!(summary.shards.len(), 2);
    assert!(!summary.stopped());
    assert!(summary.fatal_shards().is_empty());

    let path = dir.path().join("Foo").join("p1-100-0.json");
    let body = std::fs::read_to_string(&path).unwrap();
    let parsed: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["PartitionKey"], "p1");
    assert_eq!(parsed["SequenceNumber"], "100");
    // The raw artifact carries the payload exactly as it arrived: base64
    // text, re-encoded as base64 for the JSON envelope.
    assert_eq!(parsed["Data"], BASE64.encode(&data));
}

#[tokio::test]
async fn replaying_the_stream_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let records = vec![record("p1", "100", Utc::now(), b"payload")];

    let transport =
        MemoryTransport::new(vec![("shardId-000000000001".to_string(), records.clone())]);
    run(transport, config(dir.path().to_path_buf(), "Foo"))
        .await
        .unwrap();

    let path = dir.path().join("Foo").join("p1-100-0.json");
    let first = std::fs::read(&path).unwrap();

    // Restart re-reads the shard from the beginning.
    let transport = MemoryTransport::new(vec![("shardId-000000000001".to_string(), records)]);
    run(transport, config(dir.path().to_path_buf(), "Foo"))
        .await
        .unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), first);
    assert_eq!(std::fs::read_dir(dir.path().join("Foo")).unwrap().count(), 1);
}

#[tokio::test]
async fn decode_writes_decoded_artifacts_and_csv() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("export.csv");
    let transport = MemoryTransport::new(vec![(
        "shardId-000000000001".to_string(),
        vec![
            record("p1", "100", Utc::now(), &bib_payload("b1", "sierra-nypl")),
            record("p1", "101", Utc::now(), &bib_payload("b2", "sierra-nypl")),
        ],
    )]);

    let mut config = config(dir.path().to_path_buf(), "Bib");
    config.decode = true;
    config.csv_path = Some(csv_path.clone());
    run(transport, config).await.unwrap();

    let decoded = dir.path().join("Bib").join("p1-100-0.decoded.json");
    let parsed: Value =
        serde_json::from_str(&std::fs::read_to_string(&decoded).unwrap()).unwrap();
    assert_eq!(parsed["Data"]["id"], "b1");
    assert_eq!(parsed["Data"]["nyplSource"], "sierra-nypl");

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "id,nyplSource");
    assert_eq!(lines[1], "b1,sierra-nypl");
    assert_eq!(lines[2], "b2,sierra-nypl");
}

#[tokio::test]
async fn undecodable_record_still_persists_raw() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::new(vec![(
        "shardId-000000000001".to_string(),
        vec![
            record("p1", "100", Utc::now(), b"!!not avro at all!!"),
            record("p1", "101", Utc::now(), &bib_payload("b2", "sierra-nypl")),
        ],
    )]);

    let mut config = config(dir.path().to_path_buf(), "Bib");
    config.decode = true;
    let summary = run(transport, config).await.unwrap();

    // The run does not terminate on a decode failure.
    assert!(summary.fatal_shards().is_empty());

    let raw = dir.path().join("Bib").join("p1-100-0.json");
    let bad_decoded = dir.path().join("Bib").join("p1-100-0.decoded.json");
    let good_decoded = dir.path().join("Bib").join("p1-101-1.decoded.json");
    assert!(raw.is_file());
    assert!(!bad_decoded.exists());
    assert!(good_decoded.is_file());
}

#[tokio::test]
async fn stop_boundary_halts_all_shards() {
    let dir = tempfile::tempdir().unwrap();
    let boundary = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
    let before = boundary - chrono::Duration::hours(1);
    let after = boundary + chrono::Duration::hours(1);

    // Shard A crosses the boundary in its first page, so the global stop
    // fires almost immediately. Shard B's later pages are delayed well past
    // that point: by the time they could be read, every pipeline has
    // observed the stop.
    let transport = MemoryTransport::new(vec![
        (
            "shard-a".to_string(),
            vec![
                record("a", "100", before, b"a-ok"),
                record("a", "101", after, b"a-crossing"),
            ],
        ),
        (
            "shard-b".to_string(),
            vec![
                record("b", "200", before, b"b-first"),
                record("b", "201", before, b"b-late"),
                record("b", "202", before, b"b-later"),
            ],
        ),
    ])
    .with_page_size(2)
    .with_delay_after_first_read(Duration::from_millis(300));

    let mut config = config(dir.path().to_path_buf(), "Foo");
    config.stop_at = Some(boundary);
    let summary = run(transport, config).await.unwrap();

    assert!(summary.stopped());
    // The record below the boundary was persisted before the crossing.
    assert!(dir.path().join("Foo").join("a-100-0.json").is_file());
    // The crossing record itself is never persisted.
    assert!(!dir.path().join("Foo").join("a-101-1.json").exists());
    // Once the crossing is observed, shard B persists no further pages.
    // (Its already-in-flight first page may land, per the at-least-once
    // contract.)
    assert!(!dir.path().join("Foo").join("b-202-0.json").exists());
}

#[tokio::test]
async fn envelope_export_accumulates_all_shards() {
    let dir = tempfile::tempdir().unwrap();
    let envelope_path = dir.path().join("events.json");
    let transport = MemoryTransport::new(vec![
        (
            "shard-a".to_string(),
            vec![record("a", "100", Utc::now(), b"one")],
        ),
        (
            "shard-b".to_string(),
            vec![record("b", "200", Utc::now(), b"two")],
        ),
    ]);

    let mut config = config(dir.path().to_path_buf(), "Foo");
    config.envelope_path = Some(envelope_path.clone());
    run(transport, config).await.unwrap();

    let doc: Value =
        serde_json::from_str(&std::fs::read_to_string(&envelope_path).unwrap()).unwrap();
    let records = doc["Records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    for entry in records {
        assert_eq!(entry["eventSource"], "aws:kinesis");
        assert_eq!(entry["awsRegion"], "us-east-1");
        assert_eq!(
            entry["eventSourceARN"],
            "arn:aws:kinesis:us-east-1::stream/Foo"
        );
    }
}

#[tokio::test]
async fn session_deadline_stops_an_endless_stream() {
    let dir = tempfile::tempdir().unwrap();
    // A live-but-idle stream: the shard never closes, so only the session
    // deadline can end the run.
    let transport = MemoryTransport::new(vec![(
        "shard-a".to_string(),
        vec![record("p1", "100", Utc::now(), b"payload")],
    )])
    .endless();

    let mut config = config(dir.path().to_path_buf(), "Foo");
    config.session_duration = Duration::from_millis(400);
    let summary = run(transport, config).await.unwrap();

    assert!(summary.stopped());
    assert!(summary.fatal_shards().is_empty());
    // The record read before the deadline was still persisted.
    assert!(dir.path().join("Foo").join("p1-100-0.json").is_file());
}

#[tokio::test]
async fn missing_stream_is_fatal_before_any_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let transport = MemoryTransport::new(vec![]);

    let result = run(transport, config(dir.path().to_path_buf(), "missing-stream")).await;

    assert!(matches!(
        result,
        Err(AppError::Transport(TransportError::StreamNotFound(_)))
    ));
    assert!(!dir.path().join("missing-stream").exists());
}

#[tokio::test]
async fn csv_columns_stay_fixed_across_heterogeneous_records() {
    // Same property as the unit test, but end to end: a schema with an
    // optional field decodes records with differing key sets.
    const SPARSE_SCHEMA: &str = r#"{
        "type": "record",
        "name": "Sparse",
        "fields": [
            {"name": "a", "type": "long"},
            {"name": "b", "type": ["null", "long"]}
        ]
    }"#;
    let schema = Schema::parse_str(SPARSE_SCHEMA).unwrap();
    let encode = |a: i64, b: Option<i64>| {
        let datum = AvroValue::Record(vec![
            ("a".to_string(), AvroValue::Long(a)),
            (
                "b".to_string(),
                match b {
                    Some(v) => AvroValue::Union(1, Box::new(AvroValue::Long(v))),
                    None => AvroValue::Union(0, Box::new(AvroValue::Null)),
                },
            ),
        ]);
        BASE64
            .encode(to_avro_datum(&schema, datum).unwrap())
            .into_bytes()
    };

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("export.csv");
    let transport = MemoryTransport::new(vec![(
        "shard-a".to_string(),
        vec![
            record("p1", "100", Utc::now(), &encode(1, Some(2))),
            record("p1", "101", Utc::now(), &encode(3, None)),
        ],
    )]);

    let mut config = config(dir.path().to_path_buf(), "Sparse");
    config.decode = true;
    config.csv_path = Some(csv_path.clone());
    let registry = FakeRegistry {
        definition: SPARSE_SCHEMA.to_string(),
    };
    run_with(transport, registry, config).await.unwrap();

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "a,b");
    assert_eq!(lines[1], "1,2");
    assert_eq!(lines[2], "3,");
}
